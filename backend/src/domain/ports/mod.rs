//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod stats_repository;
mod token_ledger;
mod trigger_executor;
mod user_repository;

#[cfg(test)]
pub use stats_repository::MockStatsRepository;
pub use stats_repository::{
    MinuteBucket, StatsRepository, StatsRepositoryError, StoreTotals, TriggerOutcomeCounts,
    UserActivity,
};
#[cfg(test)]
pub use token_ledger::MockTokenLedger;
pub use token_ledger::{DebitReceipt, TokenLedger, TokenLedgerError};
#[cfg(test)]
pub use trigger_executor::MockTriggerExecutor;
pub use trigger_executor::{DispatchError, TriggerExecutor};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserStoreError};

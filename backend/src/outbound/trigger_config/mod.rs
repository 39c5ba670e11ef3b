//! Trigger table file: JSON loader and hot-reload watcher.

mod dto;
mod loader;
mod watcher;

pub use loader::{TriggerConfigError, load_trigger_table, parse_trigger_table};
pub use watcher::{TriggerConfigWatcher, reload_triggers};

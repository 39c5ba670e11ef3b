//! Internal Diesel row structs. Never exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Text, Timestamptz};
use uuid::Uuid;

use super::schema::{actions, recharges, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub tokens_remaining: i32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow {
    pub id: Uuid,
    pub tokens_remaining: i32,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = actions)]
pub(crate) struct NewActionRow<'a> {
    pub user_id: Uuid,
    pub trigger_id: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recharges)]
pub(crate) struct NewRechargeRow {
    pub user_id: Uuid,
}

// ---------------------------------------------------------------------------
// Aggregate rows read with `sql_query`
// ---------------------------------------------------------------------------

#[derive(Debug, QueryableByName)]
pub(crate) struct TriggerOutcomeRow {
    #[diesel(sql_type = Text)]
    pub trigger_id: String,
    #[diesel(sql_type = BigInt)]
    pub public_successes: i64,
    #[diesel(sql_type = BigInt)]
    pub admin_successes: i64,
    #[diesel(sql_type = BigInt)]
    pub public_failures: i64,
    #[diesel(sql_type = BigInt)]
    pub admin_failures: i64,
}

#[derive(Debug, QueryableByName)]
pub(crate) struct MinuteBucketRow {
    #[diesel(sql_type = Timestamptz)]
    pub minute: DateTime<Utc>,
    #[diesel(sql_type = BigInt)]
    pub public_count: i64,
    #[diesel(sql_type = BigInt)]
    pub admin_count: i64,
}

#[derive(Debug, QueryableByName)]
pub(crate) struct UserActivityRow {
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub user_id: Uuid,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Bool)]
    pub is_admin: bool,
    #[diesel(sql_type = BigInt)]
    pub actions: i64,
}

//! Diesel model structs for the local cache (categories, habits, logs).
//!
//! Every local mutation stamps `sync_status`; the pull path bypasses the
//! status rules and writes `synced` rows directly.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

/// Per-record sync classification, stored as text.
///
/// `created` means the server has never seen the record at all; `updated`
/// means it exists remotely but carries unsent local edits. A `created`
/// record that gets edited again stays `created` (it is still entirely new
/// from the server's point of view).
pub mod sync_status {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const SYNCED: &str = "synced";
}

/// Keys in the `sync_state` bookkeeping table.
pub mod sync_state_keys {
    pub const LAST_PULLED_AT: &str = "last_pulled_at";
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::categories)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::categories)]
pub struct NewCategory {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::habits)]
#[diesel(belongs_to(Category))]
pub struct Habit {
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Serialized frequency blob; decode with [`crate::models::wire::Frequency`].
    pub frequency: String,
    pub habit_type: String,
    pub goal_id: Option<String>,
    pub is_archived: bool,
    pub sync_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::habits)]
pub struct NewHabit {
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    pub frequency: String,
    pub habit_type: String,
    pub goal_id: Option<String>,
    pub is_archived: bool,
    pub sync_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::logs)]
#[diesel(belongs_to(Habit))]
pub struct Log {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    /// ISO calendar day ("2024-01-01"); at most one meaningful entry per
    /// habit per day by construction.
    pub date: String,
    pub value: bool,
    pub text: Option<String>,
    pub sync_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::logs)]
pub struct NewLog {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: String,
    pub value: bool,
    pub text: Option<String>,
    pub sync_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Insertable, Selectable)]
#[diesel(table_name = schema::sync_state)]
#[diesel(primary_key(key))]
pub struct SyncStateEntry {
    pub key: String,
    pub value: String,
}

//! Change Collector: computes the outbound delta for a push pass.
//!
//! Scans the Local Store for pending rows (habits and logs in `created` or
//! `updated` status), serializes them into the wire shape, and remembers the
//! `updated_at` each row had at collection time so the push can confirm them
//! with the optimistic guard afterwards.

use diesel::SqliteConnection;

use crate::db::models::{self as dbm, sync_status};
use crate::db::store;
use crate::models::wire::{Frequency, HabitRecord, LogRecord, PushPayload, RecordSet, SyncChanges, WireInstant};

/// `(id, updated_at)` as observed at collection time; the input to the
/// guarded `synced` transition after a successful push.
#[derive(Debug, Clone)]
pub struct RowGuard {
    pub id: String,
    pub updated_at: i64,
}

#[derive(Debug)]
pub struct CollectedBatch {
    pub payload: PushPayload,
    pub habit_guards: Vec<RowGuard>,
    pub log_guards: Vec<RowGuard>,
}

impl CollectedBatch {
    pub fn habit_count(&self) -> usize {
        self.payload.changes.habits.created.len() + self.payload.changes.habits.updated.len()
    }

    pub fn log_count(&self) -> usize {
        self.payload.changes.logs.created.len() + self.payload.changes.logs.updated.len()
    }
}

/// Assemble the outbound batch, or `None` when nothing is pending (the
/// caller must then skip the network entirely). Read-only.
///
/// The authenticated user id is injected here: habits don't carry a durable
/// user_id locally, but every pushed record needs one.
pub fn collect_pending(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<CollectedBatch>, String> {
    let created_habits = store::habits_with_status(conn, sync_status::CREATED)?;
    let updated_habits = store::habits_with_status(conn, sync_status::UPDATED)?;
    let created_logs = store::logs_with_status(conn, sync_status::CREATED)?;
    let updated_logs = store::logs_with_status(conn, sync_status::UPDATED)?;

    if created_habits.is_empty() && updated_habits.is_empty() && created_logs.is_empty() && updated_logs.is_empty()
    {
        return Ok(None);
    }

    let habit_guards = created_habits
        .iter()
        .chain(updated_habits.iter())
        .map(|h| RowGuard {
            id: h.id.clone(),
            updated_at: h.updated_at,
        })
        .collect();
    let log_guards = created_logs
        .iter()
        .chain(updated_logs.iter())
        .map(|l| RowGuard {
            id: l.id.clone(),
            updated_at: l.updated_at,
        })
        .collect();

    let payload = PushPayload {
        changes: SyncChanges {
            habits: RecordSet {
                created: created_habits.iter().map(|h| habit_to_wire(h, user_id)).collect(),
                updated: updated_habits.iter().map(|h| habit_to_wire(h, user_id)).collect(),
                // local deletions are not tracked as tombstones; archival is
                // an update and travels in created/updated
                deleted: Vec::new(),
            },
            logs: RecordSet {
                created: created_logs.iter().map(log_to_wire).collect(),
                updated: updated_logs.iter().map(log_to_wire).collect(),
                deleted: Vec::new(),
            },
        },
    };

    Ok(Some(CollectedBatch {
        payload,
        habit_guards,
        log_guards,
    }))
}

fn habit_to_wire(habit: &dbm::Habit, user_id: &str) -> HabitRecord {
    HabitRecord {
        id: habit.id.clone(),
        category_id: Some(habit.category_id.clone()),
        user_id: Some(user_id.to_string()),
        title: habit.title.clone(),
        description: habit.description.clone(),
        frequency: Some(Frequency::from_storage(&habit.frequency)),
        habit_type: Some(habit.habit_type.clone()),
        goal_id: habit.goal_id.clone(),
        is_archived: habit.is_archived,
        created_at: Some(WireInstant(habit.created_at)),
        updated_at: Some(WireInstant(habit.updated_at)),
    }
}

fn log_to_wire(log: &dbm::Log) -> LogRecord {
    LogRecord {
        id: log.id.clone(),
        habit_id: Some(log.habit_id.clone()),
        user_id: Some(log.user_id.clone()),
        date: log.date.clone(),
        value: log.value,
        text: log.text.clone(),
        created_at: Some(WireInstant(log.created_at)),
        updated_at: Some(WireInstant(log.updated_at)),
    }
}

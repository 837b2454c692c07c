//! Pull Client: fetch remote changes since the watermark and apply them to
//! the Local Store via idempotent upserts and explicit deletes.

use diesel::SqliteConnection;
use log::{debug, info, warn};

use crate::client::ApiClient;
use crate::db::models as dbm;
use crate::db::store;
use crate::models::wire::{Frequency, SyncChanges};
use crate::utils::now_millis;

pub const DEFAULT_CATEGORY_ICON: &str = "label";
pub const DEFAULT_HABIT_TYPE: &str = "build";

#[derive(Debug, Default)]
pub struct PullOutcome {
    /// Whether any habit rows exist locally after this pull applied; the
    /// signal the UI uses to route to onboarding vs the main app. Derived
    /// from the store, not the batch: an incremental pull is usually empty
    /// even for a user with plenty of data.
    pub has_data: bool,
    pub habits_applied: usize,
    pub logs_applied: usize,
    pub habits_deleted: usize,
    pub logs_deleted: usize,
    pub skipped: usize,
}

/// Hydrate the server-authoritative category reference list.
pub fn sync_categories(conn: &mut SqliteConnection, client: &ApiClient) -> Result<usize, String> {
    let categories = client
        .get_categories()
        .map_err(|e| format!("get categories failed: {}", e))?;

    let now = now_millis();
    for cat in &categories {
        let row = dbm::NewCategory {
            id: cat.id.clone(),
            name: cat.name.clone(),
            color: cat.color.clone(),
            icon: cat
                .icon
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            is_archived: false,
            created_at: cat.created_at.map(|t| t.0).unwrap_or(now),
            updated_at: cat.updated_at.map(|t| t.0).unwrap_or(now),
        };
        store::upsert_category(conn, row)?;
    }
    info!("Pull: {} categories upserted", categories.len());
    Ok(categories.len())
}

/// Pull habits and logs changed since the persisted watermark and apply
/// them. The watermark advances to the server's response timestamp only
/// after the whole batch applied; a stale watermark re-fetches more than
/// necessary but can never miss updates, because application is idempotent.
pub fn sync_user_data(conn: &mut SqliteConnection, client: &ApiClient) -> Result<PullOutcome, String> {
    let since = store::last_pulled_at(conn)?;
    debug!("Pull: requesting changes since {}", since);

    let envelope = client
        .sync_pull(since)
        .map_err(|e| format!("sync pull failed: {}", e))?;

    let outcome = apply_changes(conn, &envelope.changes)?;
    store::set_last_pulled_at(conn, envelope.timestamp)?;

    info!(
        "Pull: applied {} habit(s), {} log(s); deleted {} habit(s), {} log(s); skipped {}",
        outcome.habits_applied,
        outcome.logs_applied,
        outcome.habits_deleted,
        outcome.logs_deleted,
        outcome.skipped
    );
    Ok(outcome)
}

/// Apply one pull response to the Local Store. Re-applying the same response
/// is a no-op (upsert semantics), which is what makes a crash mid-pull
/// recoverable by simply pulling again.
pub fn apply_changes(conn: &mut SqliteConnection, changes: &SyncChanges) -> Result<PullOutcome, String> {
    let mut outcome = PullOutcome::default();
    let now = now_millis();

    // Habits first: logs reference them.
    for record in changes.habits.created.iter().chain(changes.habits.updated.iter()) {
        let Some(category_id) = record.category_id.clone() else {
            warn!("Pull: skipping habit {} with missing category_id", record.id);
            outcome.skipped += 1;
            continue;
        };
        // Same story as the log parent check below: an unknown category
        // would trip the FK constraint and abort the batch.
        if store::get_category(conn, &category_id)?.is_none() {
            warn!(
                "Pull: skipping habit {} referencing unknown category {}",
                record.id, category_id
            );
            outcome.skipped += 1;
            continue;
        }
        let row = dbm::NewHabit {
            id: record.id.clone(),
            category_id,
            title: record.title.clone(),
            description: record.description.clone(),
            frequency: record
                .frequency
                .clone()
                .unwrap_or(Frequency::Daily)
                .to_storage(),
            habit_type: record
                .habit_type
                .clone()
                .unwrap_or_else(|| DEFAULT_HABIT_TYPE.to_string()),
            goal_id: record.goal_id.clone(),
            is_archived: record.is_archived,
            sync_status: dbm::sync_status::SYNCED.to_string(),
            created_at: record.created_at.map(|t| t.0).unwrap_or(now),
            updated_at: record.updated_at.map(|t| t.0).unwrap_or(now),
        };
        store::upsert_habit(conn, row)?;
        outcome.habits_applied += 1;
    }

    for record in changes.logs.created.iter().chain(changes.logs.updated.iter()) {
        let (Some(habit_id), Some(user_id)) = (record.habit_id.clone(), record.user_id.clone()) else {
            warn!("Pull: skipping log {} with missing habit_id or user_id", record.id);
            outcome.skipped += 1;
            continue;
        };
        // A log for a habit we never stored (e.g. its habit was skipped
        // above) would trip the FK constraint and abort the batch.
        if store::get_habit(conn, &habit_id)?.is_none() {
            warn!("Pull: skipping log {} referencing unknown habit {}", record.id, habit_id);
            outcome.skipped += 1;
            continue;
        }
        let row = dbm::NewLog {
            id: record.id.clone(),
            habit_id,
            user_id,
            date: record.date.clone(),
            value: record.value,
            text: record.text.clone(),
            sync_status: dbm::sync_status::SYNCED.to_string(),
            created_at: record.created_at.map(|t| t.0).unwrap_or(now),
            updated_at: record.updated_at.map(|t| t.0).unwrap_or(now),
        };
        store::upsert_log(conn, row)?;
        outcome.logs_applied += 1;
    }

    outcome.habits_deleted = store::delete_habits_by_ids(conn, &changes.habits.deleted)?;
    outcome.logs_deleted = store::delete_logs_by_ids(conn, &changes.logs.deleted)?;

    outcome.has_data = store::has_habits(conn)?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::sync_status;
    use crate::db::store::{seed_category, test_connection};
    use crate::models::wire::{HabitRecord, LogRecord, RecordSet, WireInstant};

    fn wire_habit(id: &str, category_id: Option<&str>) -> HabitRecord {
        HabitRecord {
            id: id.to_string(),
            category_id: category_id.map(str::to_string),
            user_id: Some("u1".to_string()),
            title: format!("habit {}", id),
            description: None,
            frequency: Some(Frequency::Daily),
            habit_type: Some("build".to_string()),
            goal_id: None,
            is_archived: false,
            created_at: Some(WireInstant(1_704_067_200_000)),
            updated_at: Some(WireInstant(1_704_067_200_000)),
        }
    }

    fn wire_log(id: &str, habit_id: Option<&str>, user_id: Option<&str>) -> LogRecord {
        LogRecord {
            id: id.to_string(),
            habit_id: habit_id.map(str::to_string),
            user_id: user_id.map(str::to_string),
            date: "2024-01-01".to_string(),
            value: true,
            text: None,
            created_at: Some(WireInstant(1_704_067_200_000)),
            updated_at: Some(WireInstant(1_704_067_200_000)),
        }
    }

    #[test]
    fn applying_the_same_response_twice_is_idempotent() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let changes = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("h1", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet {
                created: vec![wire_log("l1", Some("h1"), Some("u1"))],
                ..RecordSet::default()
            },
        };

        apply_changes(&mut conn, &changes).unwrap();
        apply_changes(&mut conn, &changes).unwrap();

        assert_eq!(store::active_habits(&mut conn).unwrap().len(), 1);
        assert_eq!(store::logs_for_habit(&mut conn, "h1").unwrap().len(), 1);
    }

    #[test]
    fn pulled_rows_are_stamped_synced() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let changes = SyncChanges {
            habits: RecordSet {
                updated: vec![wire_habit("h1", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet::default(),
        };
        apply_changes(&mut conn, &changes).unwrap();

        let habit = store::get_habit(&mut conn, "h1").unwrap().unwrap();
        assert_eq!(habit.sync_status, sync_status::SYNCED);
        assert_eq!(habit.updated_at, 1_704_067_200_000);
    }

    #[test]
    fn habit_missing_category_is_skipped_not_fatal() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let changes = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("bad", None), wire_habit("good", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet::default(),
        };

        let outcome = apply_changes(&mut conn, &changes).unwrap();
        assert_eq!(outcome.habits_applied, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(store::get_habit(&mut conn, "bad").unwrap().is_none());
        assert!(store::get_habit(&mut conn, "good").unwrap().is_some());
    }

    #[test]
    fn habit_with_unknown_category_is_skipped_not_fatal() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let changes = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("bad", Some("ghost")), wire_habit("good", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet::default(),
        };

        let outcome = apply_changes(&mut conn, &changes).unwrap();
        assert_eq!(outcome.habits_applied, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(store::get_habit(&mut conn, "bad").unwrap().is_none());
        assert!(store::get_habit(&mut conn, "good").unwrap().is_some());
    }

    #[test]
    fn log_missing_fields_or_parent_is_skipped() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let changes = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("h1", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet {
                created: vec![
                    wire_log("no-habit", None, Some("u1")),
                    wire_log("no-user", Some("h1"), None),
                    wire_log("orphan", Some("missing"), Some("u1")),
                    wire_log("ok", Some("h1"), Some("u1")),
                ],
                ..RecordSet::default()
            },
        };

        let outcome = apply_changes(&mut conn, &changes).unwrap();
        assert_eq!(outcome.logs_applied, 1);
        assert_eq!(outcome.skipped, 3);
        assert!(store::get_log(&mut conn, "ok").unwrap().is_some());
    }

    #[test]
    fn deletions_remove_matching_rows() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let seed = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("h1", Some("c1")), wire_habit("h2", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet {
                created: vec![wire_log("l1", Some("h1"), Some("u1"))],
                ..RecordSet::default()
            },
        };
        apply_changes(&mut conn, &seed).unwrap();

        let deletions = SyncChanges {
            habits: RecordSet {
                deleted: vec!["h2".to_string()],
                ..RecordSet::default()
            },
            logs: RecordSet {
                deleted: vec!["l1".to_string()],
                ..RecordSet::default()
            },
        };
        let outcome = apply_changes(&mut conn, &deletions).unwrap();
        assert_eq!(outcome.habits_deleted, 1);
        assert_eq!(outcome.logs_deleted, 1);
        assert!(store::get_habit(&mut conn, "h2").unwrap().is_none());
        assert!(store::get_log(&mut conn, "l1").unwrap().is_none());
    }

    #[test]
    fn has_data_reflects_stored_habits() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");

        // Nothing stored, nothing pulled: a genuinely fresh user.
        assert!(!apply_changes(&mut conn, &SyncChanges::default()).unwrap().has_data);

        let habits = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("h1", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet::default(),
        };
        assert!(apply_changes(&mut conn, &habits).unwrap().has_data);
    }

    #[test]
    fn has_data_survives_an_empty_incremental_pull() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let first = SyncChanges {
            habits: RecordSet {
                created: vec![wire_habit("h1", Some("c1"))],
                ..RecordSet::default()
            },
            logs: RecordSet::default(),
        };
        apply_changes(&mut conn, &first).unwrap();
        store::set_last_pulled_at(&mut conn, 1_704_067_200_000).unwrap();

        // The next pull is incremental and comes back empty; the user still
        // has data and must not be routed back to onboarding.
        let outcome = apply_changes(&mut conn, &SyncChanges::default()).unwrap();
        assert!(outcome.has_data);
        assert_eq!(store::active_habits(&mut conn).unwrap().len(), 1);
    }
}

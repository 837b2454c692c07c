//! Local Store: the on-device relational cache and single source of truth
//! between syncs.
//!
//! All local reads/writes go through this module. Every user-initiated
//! mutation stamps `sync_status`; the pull path uses the `upsert_*` functions
//! which bypass the status rules and write `synced` rows directly.

use diesel::prelude::*;
use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;

use crate::db::models as dbm;
use crate::db::models::{sync_state_keys, sync_status};
use crate::models::wire::Frequency;
use crate::schema;
use crate::utils::{new_record_id, now_millis};

/// Open the cache database and enable FK enforcement (SQLite defaults to
/// off per connection).
pub fn establish(database_path: &str) -> Result<SqliteConnection, String> {
    let mut conn = SqliteConnection::establish(database_path)
        .map_err(|e| format!("DB connection failed: {}", e))?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")
        .map_err(|e| format!("enabling foreign keys failed: {}", e))?;
    Ok(conn)
}

/// Status transition for local edits: a record the server has never seen
/// stays `created` no matter how often it is edited; anything else becomes
/// `updated`. Misclassifying an unsent record as `updated` would make the
/// push send an update for a record the server doesn't have.
pub fn next_sync_status(current: &str) -> &'static str {
    if current == sync_status::CREATED {
        sync_status::CREATED
    } else {
        sync_status::UPDATED
    }
}

// =====================
// Creation (local writes, status = created)
// =====================

#[derive(Debug, Clone)]
pub struct HabitDraft {
    /// Caller-supplied id; generated when absent.
    pub id: Option<String>,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub habit_type: String,
    pub goal_id: Option<String>,
}

pub fn create_habit(conn: &mut SqliteConnection, draft: HabitDraft) -> Result<dbm::Habit, String> {
    use schema::habits::dsl as H;

    let now = now_millis();
    let row = dbm::NewHabit {
        id: draft.id.unwrap_or_else(new_record_id),
        category_id: draft.category_id,
        title: draft.title,
        description: draft.description,
        frequency: draft.frequency.to_storage(),
        habit_type: draft.habit_type,
        goal_id: draft.goal_id,
        is_archived: false,
        sync_status: sync_status::CREATED.to_string(),
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(H::habits)
        .values(&row)
        .get_result(conn)
        .map_err(|e| format!("insert habit failed: {}", e))
}

#[derive(Debug, Clone)]
pub struct LogDraft {
    pub habit_id: String,
    pub user_id: String,
    /// ISO calendar day, e.g. "2024-01-01".
    pub date: String,
    pub value: bool,
    pub text: Option<String>,
}

pub fn create_log(conn: &mut SqliteConnection, draft: LogDraft) -> Result<dbm::Log, String> {
    use schema::logs::dsl as L;

    let now = now_millis();
    let row = dbm::NewLog {
        id: new_record_id(),
        habit_id: draft.habit_id,
        user_id: draft.user_id,
        date: draft.date,
        value: draft.value,
        text: draft.text,
        sync_status: sync_status::CREATED.to_string(),
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(L::logs)
        .values(&row)
        .get_result(conn)
        .map_err(|e| format!("insert log failed: {}", e))
}

#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub id: Option<String>,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Local category creation is rare; the reference list normally arrives via
/// the category pull. Categories carry no sync_status.
pub fn create_category(conn: &mut SqliteConnection, draft: CategoryDraft) -> Result<dbm::Category, String> {
    use schema::categories::dsl as C;

    let now = now_millis();
    let row = dbm::NewCategory {
        id: draft.id.unwrap_or_else(new_record_id),
        name: draft.name,
        color: draft.color,
        icon: draft.icon,
        is_archived: false,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(C::categories)
        .values(&row)
        .get_result(conn)
        .map_err(|e| format!("insert category failed: {}", e))
}

// =====================
// Local edits (status rule applies)
// =====================

#[derive(Debug, Clone, Default)]
pub struct HabitChanges {
    pub category_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub frequency: Option<Frequency>,
    pub habit_type: Option<String>,
    pub goal_id: Option<Option<String>>,
    pub is_archived: Option<bool>,
}

pub fn update_habit(conn: &mut SqliteConnection, id: &str, changes: HabitChanges) -> Result<dbm::Habit, String> {
    use schema::habits::dsl as H;

    let current: dbm::Habit = H::habits
        .filter(H::id.eq(id))
        .first(conn)
        .map_err(|e| format!("fetch habit {} failed: {}", id, e))?;

    diesel::update(H::habits.filter(H::id.eq(id)))
        .set((
            H::category_id.eq(changes.category_id.unwrap_or(current.category_id)),
            H::title.eq(changes.title.unwrap_or(current.title)),
            H::description.eq(changes.description.unwrap_or(current.description)),
            H::frequency.eq(changes
                .frequency
                .map(|f| f.to_storage())
                .unwrap_or(current.frequency)),
            H::habit_type.eq(changes.habit_type.unwrap_or(current.habit_type)),
            H::goal_id.eq(changes.goal_id.unwrap_or(current.goal_id)),
            H::is_archived.eq(changes.is_archived.unwrap_or(current.is_archived)),
            H::sync_status.eq(next_sync_status(&current.sync_status)),
            H::updated_at.eq(now_millis()),
        ))
        .get_result(conn)
        .map_err(|e| format!("update habit {} failed: {}", id, e))
}

pub fn update_log(
    conn: &mut SqliteConnection,
    id: &str,
    value: bool,
    text: Option<String>,
) -> Result<dbm::Log, String> {
    use schema::logs::dsl as L;

    let current_status: String = L::logs
        .filter(L::id.eq(id))
        .select(L::sync_status)
        .first(conn)
        .map_err(|e| format!("fetch log {} failed: {}", id, e))?;

    diesel::update(L::logs.filter(L::id.eq(id)))
        .set((
            L::value.eq(value),
            L::text.eq(text),
            L::sync_status.eq(next_sync_status(&current_status)),
            L::updated_at.eq(now_millis()),
        ))
        .get_result(conn)
        .map_err(|e| format!("update log {} failed: {}", id, e))
}

/// Habits are never hard-deleted locally: archival is an update like any
/// other so it flows through the push path.
pub fn archive_habit(conn: &mut SqliteConnection, id: &str) -> Result<dbm::Habit, String> {
    update_habit(
        conn,
        id,
        HabitChanges {
            is_archived: Some(true),
            ..HabitChanges::default()
        },
    )
}

pub fn archive_category(conn: &mut SqliteConnection, id: &str) -> Result<(), String> {
    use schema::categories::dsl as C;

    diesel::update(C::categories.filter(C::id.eq(id)))
        .set((C::is_archived.eq(true), C::updated_at.eq(now_millis())))
        .execute(conn)
        .map_err(|e| format!("archive category {} failed: {}", id, e))?;
    Ok(())
}

/// Un-logging a day is a genuine row removal, not a value=false update.
pub fn delete_log(conn: &mut SqliteConnection, id: &str) -> Result<(), String> {
    use schema::logs::dsl as L;

    diesel::delete(L::logs.filter(L::id.eq(id)))
        .execute(conn)
        .map_err(|e| format!("delete log {} failed: {}", id, e))?;
    Ok(())
}

// =====================
// Queries
// =====================

pub fn active_habits(conn: &mut SqliteConnection) -> Result<Vec<dbm::Habit>, String> {
    use schema::habits::dsl as H;

    H::habits
        .filter(H::is_archived.eq(false))
        .order(H::created_at.desc())
        .load(conn)
        .map_err(|e| format!("list habits failed: {}", e))
}

pub fn active_categories(conn: &mut SqliteConnection) -> Result<Vec<dbm::Category>, String> {
    use schema::categories::dsl as C;

    C::categories
        .filter(C::is_archived.eq(false))
        .order(C::name.asc())
        .load(conn)
        .map_err(|e| format!("list categories failed: {}", e))
}

pub fn get_habit(conn: &mut SqliteConnection, id: &str) -> Result<Option<dbm::Habit>, String> {
    use schema::habits::dsl as H;

    H::habits
        .filter(H::id.eq(id))
        .first(conn)
        .optional()
        .map_err(|e| format!("fetch habit {} failed: {}", id, e))
}

pub fn get_category(conn: &mut SqliteConnection, id: &str) -> Result<Option<dbm::Category>, String> {
    use schema::categories::dsl as C;

    C::categories
        .filter(C::id.eq(id))
        .first(conn)
        .optional()
        .map_err(|e| format!("fetch category {} failed: {}", id, e))
}

/// Whether any habit rows exist at all, archived included. This is the
/// onboarding-vs-main-app routing signal after a pull; it has to reflect the
/// whole store, not just the latest (possibly empty) incremental batch.
pub fn has_habits(conn: &mut SqliteConnection) -> Result<bool, String> {
    use schema::habits::dsl as H;

    let n: i64 = H::habits
        .count()
        .get_result(conn)
        .map_err(|e| format!("count habits failed: {}", e))?;
    Ok(n > 0)
}

pub fn get_log(conn: &mut SqliteConnection, id: &str) -> Result<Option<dbm::Log>, String> {
    use schema::logs::dsl as L;

    L::logs
        .filter(L::id.eq(id))
        .first(conn)
        .optional()
        .map_err(|e| format!("fetch log {} failed: {}", id, e))
}

pub fn logs_for_habit(conn: &mut SqliteConnection, habit_id: &str) -> Result<Vec<dbm::Log>, String> {
    use schema::logs::dsl as L;

    L::logs
        .filter(L::habit_id.eq(habit_id))
        .order(L::date.desc())
        .load(conn)
        .map_err(|e| format!("list logs for habit {} failed: {}", habit_id, e))
}

pub fn logs_by_date(conn: &mut SqliteConnection, date: &str) -> Result<Vec<dbm::Log>, String> {
    use schema::logs::dsl as L;

    L::logs
        .filter(L::date.eq(date))
        .load(conn)
        .map_err(|e| format!("list logs for date {} failed: {}", date, e))
}

/// Rows with a given sync_status; the Change Collector's scan. Cheap and
/// side-effect free.
pub fn habits_with_status(conn: &mut SqliteConnection, status: &str) -> Result<Vec<dbm::Habit>, String> {
    use schema::habits::dsl as H;

    H::habits
        .filter(H::sync_status.eq(status))
        .load(conn)
        .map_err(|e| format!("list {} habits failed: {}", status, e))
}

pub fn logs_with_status(conn: &mut SqliteConnection, status: &str) -> Result<Vec<dbm::Log>, String> {
    use schema::logs::dsl as L;

    L::logs
        .filter(L::sync_status.eq(status))
        .load(conn)
        .map_err(|e| format!("list {} logs failed: {}", status, e))
}

// =====================
// Pull application (idempotent upserts, status forced to synced)
// =====================

pub fn upsert_category(conn: &mut SqliteConnection, row: dbm::NewCategory) -> Result<(), String> {
    use schema::categories::dsl as C;

    diesel::insert_into(C::categories)
        .values(&row)
        .on_conflict(C::id)
        .do_update()
        .set((
            C::name.eq(row.name.clone()),
            C::color.eq(row.color.clone()),
            C::icon.eq(row.icon.clone()),
            C::is_archived.eq(row.is_archived),
            C::updated_at.eq(row.updated_at),
        ))
        .execute(conn)
        .map_err(|e| format!("upsert category failed: {}", e))?;
    Ok(())
}

pub fn upsert_habit(conn: &mut SqliteConnection, mut row: dbm::NewHabit) -> Result<(), String> {
    use schema::habits::dsl as H;

    // Pulled rows reflect server truth at the moment of pull.
    row.sync_status = sync_status::SYNCED.to_string();

    diesel::insert_into(H::habits)
        .values(&row)
        .on_conflict(H::id)
        .do_update()
        .set((
            H::category_id.eq(row.category_id.clone()),
            H::title.eq(row.title.clone()),
            H::description.eq(row.description.clone()),
            H::frequency.eq(row.frequency.clone()),
            H::habit_type.eq(row.habit_type.clone()),
            H::goal_id.eq(row.goal_id.clone()),
            H::is_archived.eq(row.is_archived),
            H::sync_status.eq(row.sync_status.clone()),
            H::created_at.eq(row.created_at),
            H::updated_at.eq(row.updated_at),
        ))
        .execute(conn)
        .map_err(|e| format!("upsert habit failed: {}", e))?;
    Ok(())
}

pub fn upsert_log(conn: &mut SqliteConnection, mut row: dbm::NewLog) -> Result<(), String> {
    use schema::logs::dsl as L;

    row.sync_status = sync_status::SYNCED.to_string();

    diesel::insert_into(L::logs)
        .values(&row)
        .on_conflict(L::id)
        .do_update()
        .set((
            L::habit_id.eq(row.habit_id.clone()),
            L::user_id.eq(row.user_id.clone()),
            L::date.eq(row.date.clone()),
            L::value.eq(row.value),
            L::text.eq(row.text.clone()),
            L::sync_status.eq(row.sync_status.clone()),
            L::created_at.eq(row.created_at),
            L::updated_at.eq(row.updated_at),
        ))
        .execute(conn)
        .map_err(|e| format!("upsert log failed: {}", e))?;
    Ok(())
}

pub fn delete_habits_by_ids(conn: &mut SqliteConnection, ids: &[String]) -> Result<usize, String> {
    use schema::habits::dsl as H;

    if ids.is_empty() {
        return Ok(0);
    }
    diesel::delete(H::habits.filter(H::id.eq_any(ids)))
        .execute(conn)
        .map_err(|e| format!("delete habits failed: {}", e))
}

pub fn delete_logs_by_ids(conn: &mut SqliteConnection, ids: &[String]) -> Result<usize, String> {
    use schema::logs::dsl as L;

    if ids.is_empty() {
        return Ok(0);
    }
    diesel::delete(L::logs.filter(L::id.eq_any(ids)))
        .execute(conn)
        .map_err(|e| format!("delete logs failed: {}", e))
}

// =====================
// Push confirmation (optimistic guard)
// =====================

/// Mark a pushed habit `synced`, but only if `updated_at` still matches what
/// the collector observed. A user edit made while the push was in flight
/// changes `updated_at`, the guard misses, and the row stays pending for the
/// next pass. Returns whether the guard matched.
pub fn confirm_habit_synced(
    conn: &mut SqliteConnection,
    id: &str,
    observed_updated_at: i64,
) -> Result<bool, String> {
    use schema::habits::dsl as H;

    let n = diesel::update(
        H::habits.filter(H::id.eq(id).and(H::updated_at.eq(observed_updated_at))),
    )
    .set(H::sync_status.eq(sync_status::SYNCED))
    .execute(conn)
    .map_err(|e| format!("confirm habit {} synced failed: {}", id, e))?;
    Ok(n == 1)
}

pub fn confirm_log_synced(
    conn: &mut SqliteConnection,
    id: &str,
    observed_updated_at: i64,
) -> Result<bool, String> {
    use schema::logs::dsl as L;

    let n = diesel::update(L::logs.filter(L::id.eq(id).and(L::updated_at.eq(observed_updated_at))))
        .set(L::sync_status.eq(sync_status::SYNCED))
        .execute(conn)
        .map_err(|e| format!("confirm log {} synced failed: {}", id, e))?;
    Ok(n == 1)
}

// =====================
// Sync bookkeeping
// =====================

/// Last successful pull watermark in epoch millis; 0 when never pulled (full
/// fetch). An unparsable stored value also degrades to 0, which only
/// over-fetches.
pub fn last_pulled_at(conn: &mut SqliteConnection) -> Result<i64, String> {
    use schema::sync_state::dsl as S;

    let stored: Option<String> = S::sync_state
        .filter(S::key.eq(sync_state_keys::LAST_PULLED_AT))
        .select(S::value)
        .first(conn)
        .optional()
        .map_err(|e| format!("fetch watermark failed: {}", e))?;
    Ok(stored.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0))
}

pub fn set_last_pulled_at(conn: &mut SqliteConnection, millis: i64) -> Result<(), String> {
    use schema::sync_state::dsl as S;

    let row = dbm::SyncStateEntry {
        key: sync_state_keys::LAST_PULLED_AT.to_string(),
        value: millis.to_string(),
    };
    diesel::insert_into(S::sync_state)
        .values(&row)
        .on_conflict(S::key)
        .do_update()
        .set(S::value.eq(row.value.clone()))
        .execute(conn)
        .map_err(|e| format!("store watermark failed: {}", e))?;
    Ok(())
}

/// Recovery path for local schema drift: the cache is disposable, so wipe
/// all rows and the watermark, then re-pull everything from the server.
pub fn reset_local_cache(conn: &mut SqliteConnection) -> Result<(), String> {
    use schema::categories::dsl as C;
    use schema::habits::dsl as H;
    use schema::logs::dsl as L;
    use schema::sync_state::dsl as S;

    diesel::delete(L::logs)
        .execute(conn)
        .map_err(|e| format!("clear logs failed: {}", e))?;
    diesel::delete(H::habits)
        .execute(conn)
        .map_err(|e| format!("clear habits failed: {}", e))?;
    diesel::delete(C::categories)
        .execute(conn)
        .map_err(|e| format!("clear categories failed: {}", e))?;
    diesel::delete(S::sync_state)
        .execute(conn)
        .map_err(|e| format!("clear sync state failed: {}", e))?;
    Ok(())
}

#[cfg(test)]
pub fn test_connection() -> SqliteConnection {
    use diesel_migrations::MigrationHarness;

    let mut conn = SqliteConnection::establish(":memory:").expect("open in-memory db");
    conn.batch_execute("PRAGMA foreign_keys = ON;").expect("enable fks");
    conn.run_pending_migrations(crate::MIGRATIONS).expect("run migrations");
    conn
}

#[cfg(test)]
pub fn seed_category(conn: &mut SqliteConnection, id: &str) -> dbm::Category {
    create_category(
        conn,
        CategoryDraft {
            id: Some(id.to_string()),
            name: format!("category {}", id),
            color: "#336699".to_string(),
            icon: "label".to_string(),
        },
    )
    .expect("seed category")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_habit(conn: &mut SqliteConnection, id: &str, category_id: &str) -> dbm::Habit {
        create_habit(
            conn,
            HabitDraft {
                id: Some(id.to_string()),
                category_id: category_id.to_string(),
                title: "Run".to_string(),
                description: None,
                frequency: Frequency::Daily,
                habit_type: "build".to_string(),
                goal_id: None,
            },
        )
        .expect("seed habit")
    }

    #[test]
    fn create_habit_requires_existing_category() {
        let mut conn = test_connection();
        let result = create_habit(
            &mut conn,
            HabitDraft {
                id: None,
                category_id: "nope".to_string(),
                title: "Run".to_string(),
                description: None,
                frequency: Frequency::Daily,
                habit_type: "build".to_string(),
                goal_id: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_stamps_created_status_and_id() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let habit = seed_habit(&mut conn, "h1", "c1");
        assert_eq!(habit.sync_status, sync_status::CREATED);
        assert_eq!(habit.created_at, habit.updated_at);

        let generated = create_habit(
            &mut conn,
            HabitDraft {
                id: None,
                category_id: "c1".to_string(),
                title: "Read".to_string(),
                description: None,
                frequency: Frequency::Weekly { times: 3 },
                habit_type: "build".to_string(),
                goal_id: None,
            },
        )
        .unwrap();
        assert_eq!(generated.id.len(), 32);
    }

    #[test]
    fn update_never_regresses_created_to_updated() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        seed_habit(&mut conn, "h1", "c1");

        let edited = update_habit(
            &mut conn,
            "h1",
            HabitChanges {
                title: Some("Run 5k".to_string()),
                ..HabitChanges::default()
            },
        )
        .unwrap();
        assert_eq!(edited.sync_status, sync_status::CREATED);
        assert_eq!(edited.title, "Run 5k");
    }

    #[test]
    fn update_transitions_synced_to_updated() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let habit = seed_habit(&mut conn, "h1", "c1");
        assert!(confirm_habit_synced(&mut conn, "h1", habit.updated_at).unwrap());

        let edited = update_habit(
            &mut conn,
            "h1",
            HabitChanges {
                title: Some("Run 10k".to_string()),
                ..HabitChanges::default()
            },
        )
        .unwrap();
        assert_eq!(edited.sync_status, sync_status::UPDATED);
    }

    #[test]
    fn archive_is_an_update_not_a_delete() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        seed_habit(&mut conn, "h1", "c1");

        let archived = archive_habit(&mut conn, "h1").unwrap();
        assert!(archived.is_archived);
        assert_eq!(archived.sync_status, sync_status::CREATED);
        // still present in the table, just excluded from default queries
        assert!(get_habit(&mut conn, "h1").unwrap().is_some());
        assert!(active_habits(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn delete_log_removes_the_row() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        seed_habit(&mut conn, "h1", "c1");
        let log = create_log(
            &mut conn,
            LogDraft {
                habit_id: "h1".to_string(),
                user_id: "u1".to_string(),
                date: "2024-01-01".to_string(),
                value: true,
                text: None,
            },
        )
        .unwrap();

        delete_log(&mut conn, &log.id).unwrap();
        assert!(get_log(&mut conn, &log.id).unwrap().is_none());
        assert!(logs_with_status(&mut conn, sync_status::CREATED).unwrap().is_empty());
    }

    #[test]
    fn deleting_a_habit_row_cascades_to_logs() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        seed_habit(&mut conn, "h1", "c1");
        create_log(
            &mut conn,
            LogDraft {
                habit_id: "h1".to_string(),
                user_id: "u1".to_string(),
                date: "2024-01-01".to_string(),
                value: true,
                text: None,
            },
        )
        .unwrap();

        delete_habits_by_ids(&mut conn, &["h1".to_string()]).unwrap();
        assert!(logs_for_habit(&mut conn, "h1").unwrap().is_empty());
    }

    #[test]
    fn guard_fails_after_concurrent_edit() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let habit = seed_habit(&mut conn, "h1", "c1");
        let observed = habit.updated_at;

        // simulate a user edit landing between collection and the server ack
        use schema::habits::dsl as H;
        diesel::update(H::habits.filter(H::id.eq("h1")))
            .set((H::title.eq("Run further"), H::updated_at.eq(observed + 1)))
            .execute(&mut conn)
            .unwrap();

        assert!(!confirm_habit_synced(&mut conn, "h1", observed).unwrap());
        let row = get_habit(&mut conn, "h1").unwrap().unwrap();
        assert_ne!(row.sync_status, sync_status::SYNCED);
    }

    #[test]
    fn upsert_habit_is_idempotent_and_forces_synced() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        let row = dbm::NewHabit {
            id: "h1".to_string(),
            category_id: "c1".to_string(),
            title: "Run".to_string(),
            description: None,
            frequency: Frequency::Daily.to_storage(),
            habit_type: "build".to_string(),
            goal_id: None,
            is_archived: false,
            sync_status: sync_status::CREATED.to_string(),
            created_at: 1,
            updated_at: 2,
        };
        upsert_habit(&mut conn, row.clone()).unwrap();
        upsert_habit(&mut conn, row).unwrap();

        let habits = active_habits(&mut conn).unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].sync_status, sync_status::SYNCED);
        assert_eq!(habits[0].updated_at, 2);
    }

    #[test]
    fn watermark_round_trip() {
        let mut conn = test_connection();
        assert_eq!(last_pulled_at(&mut conn).unwrap(), 0);
        set_last_pulled_at(&mut conn, 1_704_067_200_000).unwrap();
        assert_eq!(last_pulled_at(&mut conn).unwrap(), 1_704_067_200_000);
        set_last_pulled_at(&mut conn, 1_704_153_600_000).unwrap();
        assert_eq!(last_pulled_at(&mut conn).unwrap(), 1_704_153_600_000);
    }

    #[test]
    fn reset_clears_rows_and_watermark() {
        let mut conn = test_connection();
        seed_category(&mut conn, "c1");
        seed_habit(&mut conn, "h1", "c1");
        set_last_pulled_at(&mut conn, 123).unwrap();

        reset_local_cache(&mut conn).unwrap();
        assert!(active_categories(&mut conn).unwrap().is_empty());
        assert!(active_habits(&mut conn).unwrap().is_empty());
        assert_eq!(last_pulled_at(&mut conn).unwrap(), 0);
    }
}

//! Push Client: deliver the outbound batch, then reconcile local
//! sync_status, then absorb canonical server state with a pull.

use diesel::SqliteConnection;
use log::{debug, info};

use crate::client::ApiClient;
use crate::db::store;
use crate::services::collect::{self, CollectedBatch};
use crate::services::pull;

#[derive(Debug, Default)]
pub struct PushOutcome {
    pub habits_pushed: usize,
    pub logs_pushed: usize,
    /// Rows whose guard matched and were marked `synced`. Rows edited while
    /// the push was in flight fail the guard, stay pending, and go out again
    /// on the next pass.
    pub confirmed: usize,
}

/// Run one push pass. Returns `Ok(None)` without touching the network when
/// nothing is pending.
///
/// The status transition only runs after a successful response; a failed
/// HTTP call leaves every row exactly as it was, so a retry re-collects the
/// same batch. Partial confirmation cannot result from a failed call.
pub fn run(
    conn: &mut SqliteConnection,
    client: &ApiClient,
    user_id: &str,
) -> Result<Option<PushOutcome>, String> {
    let Some(batch) = collect::collect_pending(conn, user_id)? else {
        debug!("Push: nothing pending");
        return Ok(None);
    };

    info!(
        "Push: sending {} habit(s), {} log(s)",
        batch.habit_count(),
        batch.log_count()
    );
    client
        .sync_push(&batch.payload)
        .map_err(|e| format!("sync push failed: {}", e))?;

    let confirmed = confirm_synced(conn, &batch)?;
    let outcome = PushOutcome {
        habits_pushed: batch.habit_count(),
        logs_pushed: batch.log_count(),
        confirmed,
    };
    info!(
        "Push: server accepted; {}/{} row(s) confirmed synced",
        outcome.confirmed,
        outcome.habits_pushed + outcome.logs_pushed
    );

    // Absorb the just-pushed records coming back with canonical server
    // timestamps (plus anything else that changed remotely meanwhile).
    pull::sync_user_data(conn, client)?;

    Ok(Some(outcome))
}

/// Guarded `synced` transition for every row of an acknowledged batch.
pub fn confirm_synced(conn: &mut SqliteConnection, batch: &CollectedBatch) -> Result<usize, String> {
    let mut confirmed = 0;
    for guard in &batch.habit_guards {
        if store::confirm_habit_synced(conn, &guard.id, guard.updated_at)? {
            confirmed += 1;
        } else {
            debug!("Push: habit {} changed mid-flight, left pending", guard.id);
        }
    }
    for guard in &batch.log_guards {
        if store::confirm_log_synced(conn, &guard.id, guard.updated_at)? {
            confirmed += 1;
        } else {
            debug!("Push: log {} changed mid-flight, left pending", guard.id);
        }
    }
    Ok(confirmed)
}

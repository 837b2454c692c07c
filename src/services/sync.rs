//! Sync Orchestrator: sequences category sync → push → pull and presents one
//! coherent outcome.
//!
//! A pass runs to completion or failure; there is no mid-flight
//! cancellation, and retries are caller-driven (just invoke `run` again — a
//! failed push leaves local state untouched, so re-running is always safe).

use core::fmt;
use diesel::SqliteConnection;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::client::ApiClient;
use crate::services::{pull, push};

/// Steps of one sync pass, in order. Failure can strike at any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    SyncingCategories,
    PushingLocal,
    PullingRemote,
}

impl Display for SyncPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::SyncingCategories => write!(f, "syncing categories"),
            SyncPhase::PushingLocal => write!(f, "pushing local changes"),
            SyncPhase::PullingRemote => write!(f, "pulling remote changes"),
        }
    }
}

/// A sync pass that did not reach `Done`, tagged with the phase it failed
/// in so the UI can offer a targeted retry message.
#[derive(Debug)]
pub struct SyncError {
    pub phase: SyncPhase,
    pub message: String,
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "sync failed while {}: {}", self.phase, self.message)
    }
}

impl Error for SyncError {}

#[derive(Debug)]
pub struct SyncOutcome {
    /// Whether any user habit data exists after this pass (onboarding
    /// routing signal).
    pub has_data: bool,
}

fn fail(phase: SyncPhase) -> impl FnOnce(String) -> SyncError {
    move |message| SyncError { phase, message }
}

/// Run one full sync pass.
///
/// The user-data pull runs twice on a pass with pending changes: once inside
/// the push (to absorb the just-pushed rows' canonical state) and once here.
/// The redundancy is deliberate; pull application is idempotent.
pub fn run(conn: &mut SqliteConnection, client: &ApiClient, user_id: &str) -> Result<SyncOutcome, SyncError> {
    info!("Sync: {}", SyncPhase::SyncingCategories);
    pull::sync_categories(conn, client).map_err(fail(SyncPhase::SyncingCategories))?;

    info!("Sync: {}", SyncPhase::PushingLocal);
    push::run(conn, client, user_id).map_err(fail(SyncPhase::PushingLocal))?;

    info!("Sync: {}", SyncPhase::PullingRemote);
    let outcome = pull::sync_user_data(conn, client).map_err(fail(SyncPhase::PullingRemote))?;

    info!("Sync: done (has_data={})", outcome.has_data);
    Ok(SyncOutcome {
        has_data: outcome.has_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_names_the_failing_phase() {
        let err = SyncError {
            phase: SyncPhase::PushingLocal,
            message: "http 503: unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "sync failed while pushing local changes: http 503: unavailable"
        );
    }
}

//! habitsync: offline-first sync engine for a habit-tracking client.
//!
//! A local SQLite cache (categories, habits, logs) is the single source of
//! truth between syncs; a sync pass pushes pending local changes and pulls
//! remote ones, with an optimistic per-row guard preventing in-flight edits
//! from being silently marked synced.

pub mod models {
    pub mod wire;
}

pub mod client;
pub mod config;
pub mod db {
    pub mod models;
    pub mod store;
}
pub mod schema;
pub mod utils;
pub mod services {
    pub mod collect;
    pub mod pull;
    pub mod push;
    pub mod sync;
}

use crate::client::ApiClient;
use crate::config::Config;
use crate::db::store;
use crate::services::sync;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{info, warn};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn apply_database_migrations(conn: &mut SqliteConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Local cache schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} cache migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        // The cache is disposable: the documented recovery for a drifted
        // schema is HABITSYNC_RESET_CACHE=1 followed by a full re-pull.
        Err(e) => Err(format!("Applying cache migrations failed: {}", e)),
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (db={}, api={}, user={}, reset_cache={})",
        cfg.database_path, cfg.api_base_url, cfg.user_id, cfg.reset_cache
    );

    // 2) Open local cache
    let mut conn = store::establish(&cfg.database_path)?;
    info!("Local cache opened");

    // 3) Apply pending cache migrations
    apply_database_migrations(&mut conn)?;

    // 4) Optional cache reset (schema-drift recovery; the server is the
    //    source of truth, so the next pull repopulates from watermark 0)
    if cfg.reset_cache {
        warn!("Resetting local cache on request");
        store::reset_local_cache(&mut conn)?;
    }

    // 5) Init API client
    let client = ApiClient::new(&cfg.api_base_url, &cfg.access_token)
        .map_err(|e| format!("API client init failed: {}", e))?;

    // 6) Run one sync pass
    let outcome = sync::run(&mut conn, &client, &cfg.user_id).map_err(|e| e.to_string())?;
    info!(
        "Sync pass complete; user {} data on server",
        if outcome.has_data { "has" } else { "has no" }
    );

    Ok(())
}

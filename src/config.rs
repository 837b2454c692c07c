//! Minimal runtime configuration helpers.
//!
//! The auth flow (login, token refresh) lives outside this process; the sync
//! engine only consumes the resulting bearer token and user id.

use std::{fs, path::Path};

pub const DEFAULT_DATABASE_PATH: &str = "habitsync.db";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api/v1";

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the local SQLite cache file.
    pub database_path: String,
    /// Base URL of the sync backend.
    pub api_base_url: String,
    /// Bearer token issued by the auth flow.
    pub access_token: String,
    /// Authenticated user id, attached to pushed records.
    pub user_id: String,
    /// When set, wipe the local cache and re-pull everything from scratch
    /// (recovery path for local schema drift).
    pub reset_cache: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_path =
            std::env::var("HABITSYNC_DB_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
        let api_base_url =
            std::env::var("HABITSYNC_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        // Prefer env var; fallback to token.txt in working directory
        let access_token = match std::env::var("HABITSYNC_ACCESS_TOKEN") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                let path = Path::new("token.txt");
                match fs::read_to_string(path) {
                    Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
                    _ => return Err(
                        "Missing access token: set HABITSYNC_ACCESS_TOKEN or provide token.txt in working directory"
                            .to_string(),
                    ),
                }
            }
        };

        let user_id = match std::env::var("HABITSYNC_USER_ID") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => return Err("Missing user id: set HABITSYNC_USER_ID".to_string()),
        };

        let reset_cache = std::env::var("HABITSYNC_RESET_CACHE")
            .ok()
            .map(|s| matches!(s.as_str(), "1" | "true" | "TRUE"))
            .unwrap_or(false);

        Ok(Config {
            database_path,
            api_base_url,
            access_token,
            user_id,
            reset_cache,
        })
    }
}

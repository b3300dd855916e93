use directories::ProjectDirs;
use std::path::PathBuf;

use crate::config::Config;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("waymark");
            Some(state_dir.join("workouts.db"))
        } else {
            ProjectDirs::from("", "", "waymark")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("workouts.db"))
        }
    }

    /// Database location for this run: explicit override, then config, then default.
    pub fn resolve_db_path(override_path: Option<PathBuf>, config: &Config) -> PathBuf {
        override_path
            .or_else(|| config.database_path.clone())
            .or_else(Self::db_path)
            .unwrap_or_else(|| PathBuf::from("waymark_workouts.db"))
    }
}

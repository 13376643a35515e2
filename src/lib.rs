// src/lib.rs
use anyhow::{Context, Result};
// Use anyhow::Result as standard Result for service layer
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// --- Declare modules ---
pub mod catalog;
mod config;
pub mod dates;
pub mod engine;
pub mod store;
pub mod sync;

// --- Expose public types ---
pub use catalog::{available_exercises, default_exercises, MuscleGroup, WEIGHT_INCREMENTS};
pub use config::{
    get_config_path as get_config_path_util,
    load as load_config_util,
    sanitize_username,
    save as save_config_util,
    Config,
    Error as ConfigError, // Renamed from Error
};
pub use dates::{format_date_key, today_key, weekday_name};
pub use engine::{
    append_set, delete_set, history_for_group, previous_performance, PreviousPerformance,
};
pub use store::{
    decode, new_id, DailyLog, DayPatch, ExercisesPatch, LoggedSet, StorePatch, WorkoutStore,
};
pub use sync::{
    document_path,
    DocumentBackend,
    Error as SyncError, // Renamed from Error
    MemoryBackend,
    Subscription,
    SyncAdapter,
    VersionedDocument,
    WatchCallback,
    WatchEvent,
    WatchId,
};

pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    pub sync: SyncAdapter,
}

impl AppService {
    /// Initializes the application service against an injected document
    /// backend.
    /// # Errors
    /// Returns `anyhow::Error` if config path determination or loading fails.
    pub fn initialize(backend: Arc<dyn DocumentBackend>) -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        Ok(Self {
            config,
            config_path,
            sync: SyncAdapter::new(backend),
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Establishes the logged-in username, sanitized for use as a document
    /// key, and persists it as the device's durable identity.
    /// # Errors
    /// - `ConfigError::InvalidUsername` if nothing survives sanitization.
    /// - `ConfigError` variants if saving fails.
    pub fn login(&mut self, name: &str) -> Result<String, ConfigError> {
        let sanitized = config::sanitize_username(name);
        if sanitized.is_empty() {
            return Err(ConfigError::InvalidUsername(
                "Username cannot be empty.".to_string(),
            ));
        }
        self.config.username = Some(sanitized.clone());
        self.save_config()?;
        Ok(sanitized)
    }

    /// Clears the logged-in username.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn logout(&mut self) -> Result<(), ConfigError> {
        self.config.username = None;
        self.save_config()
    }

    pub fn username(&self) -> Option<&str> {
        self.config.username.as_deref()
    }

    /// Gets the established username.
    /// # Errors
    /// Returns `ConfigError::UsernameNotSet` if nobody is logged in.
    pub fn require_username(&self) -> Result<&str, ConfigError> {
        self.config
            .username
            .as_deref()
            .ok_or_else(|| ConfigError::UsernameNotSet(self.config_path.clone()))
    }

    /// Subscribes to the logged-in user's store. The caller derives its
    /// state solely from this stream, never from an optimistic local copy.
    /// # Errors
    /// Returns `ConfigError::UsernameNotSet` if nobody is logged in.
    pub fn subscribe<C, E>(&self, on_change: C, on_error: E) -> Result<Subscription, ConfigError>
    where
        C: Fn(WorkoutStore) + Send + Sync + 'static,
        E: Fn(SyncError) + Send + Sync + 'static,
    {
        let username = self.require_username()?;
        Ok(self.sync.subscribe(username, on_change, on_error))
    }

    /// Logs one set on the moment's local calendar day and persists the
    /// merge. Returns `Ok(false)` without writing when the input fails the
    /// append guards (empty name, non-positive weight, Rest day).
    /// # Errors
    /// Returns `anyhow::Error` if nobody is logged in or the write fails.
    pub fn log_set(
        &self,
        moment: DateTime<Local>,
        group: MuscleGroup,
        name: &str,
        weight: f64,
    ) -> Result<bool> {
        let username = self.require_username()?;
        let date_key = dates::format_date_key(moment);
        let day_of_week = dates::weekday_name(moment);
        let Some(patch) = engine::append_set(&date_key, group, &day_of_week, name, weight) else {
            return Ok(false);
        };
        self.sync
            .persist(username, &patch)
            .with_context(|| format!("Failed to save set for {date_key}"))?;
        Ok(true)
    }

    /// Removes a set by id from the given day and persists the merge.
    /// Returns `Ok(false)` without writing when no log exists for the day.
    /// # Errors
    /// Returns `anyhow::Error` if nobody is logged in or the write fails.
    pub fn remove_set(&self, current: &WorkoutStore, date_key: &str, set_id: &str) -> Result<bool> {
        let username = self.require_username()?;
        let Some(patch) = engine::delete_set(current, date_key, set_id) else {
            return Ok(false);
        };
        self.sync
            .persist(username, &patch)
            .with_context(|| format!("Failed to remove set from {date_key}"))?;
        Ok(true)
    }
}

//! Settings for the REPL worker, the result pump and the entry actions.
//!
//! Settings live in an optional JSON file. Missing keys fall back to defaults,
//! so an empty `{}` file is valid.

use parking_lot::RwLock;
use pycalc::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default worker read timeout, also the placeholder heartbeat interval
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 3_000;

/// Default bounded wait of one pump tick before the stall prompt
pub const DEFAULT_STALL_TIMEOUT_MS: u64 = 30_000;

/// Default delay before the pump re-arms itself
pub const DEFAULT_RESCHEDULE_DELAY_MS: u64 = 10;

/// Default time the error panel stays visible
pub const DEFAULT_PANEL_DURATION_MS: u64 = 7_000;

/// Default capacity of the result queue
pub const DEFAULT_OUTPUT_CAPACITY: usize = 256;

/// User-facing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether line evaluation is enabled
    pub enabled: bool,

    /// Worker read timeout in milliseconds
    pub idle_timeout_ms: u64,

    /// Pump bounded wait in milliseconds
    pub stall_timeout_ms: u64,

    /// Pump re-arm delay in milliseconds
    pub reschedule_delay_ms: u64,

    /// Error panel auto-hide delay in milliseconds
    pub panel_duration_ms: u64,

    /// Result queue capacity
    pub output_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            stall_timeout_ms: DEFAULT_STALL_TIMEOUT_MS,
            reschedule_delay_ms: DEFAULT_RESCHEDULE_DELAY_MS,
            panel_duration_ms: DEFAULT_PANEL_DURATION_MS,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }
}

impl Settings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn reschedule_delay(&self) -> Duration {
        Duration::from_millis(self.reschedule_delay_ms)
    }

    pub fn panel_duration(&self) -> Duration {
        Duration::from_millis(self.panel_duration_ms)
    }

    /// Result queue capacity, never zero.
    ///
    /// A zero-capacity queue would block every placeholder publish until a pump
    /// is waiting on the other end.
    pub fn output_capacity(&self) -> usize {
        self.output_capacity.max(1)
    }

    /// Reject timings under which an idle worker looks stalled.
    ///
    /// The worker publishes a placeholder every `idle_timeout_ms` while idle,
    /// and the pump prompts after `stall_timeout_ms` without a result, so the
    /// heartbeat must be strictly shorter than the pump's wait.
    pub fn validate(&self) -> Result<()> {
        if self.stall_timeout_ms == 0 {
            return Err(Error::Config(
                "stall_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.idle_timeout_ms >= self.stall_timeout_ms {
            return Err(Error::Config(format!(
                "idle_timeout_ms ({}) must be less than stall_timeout_ms ({})",
                self.idle_timeout_ms, self.stall_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Settings with an optional backing file
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    /// In-memory settings that are never persisted
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            settings: RwLock::new(settings),
        }
    }

    /// Load settings from `path`, falling back to defaults if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                Error::context(format!("failed to read settings {}", path.display()), e)
            })?;
            let settings: Settings = serde_json::from_str(&raw)?;
            settings.validate()?;
            info!("Loaded settings from {}", path.display());
            settings
        } else {
            debug!("No settings at {}, using defaults", path.display());
            Settings::default()
        };

        Ok(Self {
            path: Some(path),
            settings: RwLock::new(settings),
        })
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.read().enabled
    }

    /// Set the enabled flag and persist it
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.update_enabled(|_| enabled).map(|_| ())
    }

    /// Flip the enabled flag, persist it, and return the new value
    pub fn toggle(&self) -> Result<bool> {
        self.update_enabled(|enabled| !enabled)
    }

    fn update_enabled(&self, next: impl FnOnce(bool) -> bool) -> Result<bool> {
        let mut settings = self.settings.write();
        settings.enabled = next(settings.enabled);
        self.save(&settings)?;
        Ok(settings.enabled)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, json)
            .map_err(|e| Error::context(format!("failed to write settings {}", path.display()), e))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::in_memory(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("pycalc.json")).unwrap();
        assert_eq!(store.get(), Settings::default());
        assert!(store.is_enabled());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pycalc.json");
        std::fs::write(&path, r#"{"enabled": false, "stall_timeout_ms": 500}"#).unwrap();

        let settings = SettingsStore::open(&path).unwrap().get();
        assert!(!settings.enabled);
        assert_eq!(settings.stall_timeout(), Duration::from_millis(500));
        assert_eq!(settings.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pycalc.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SettingsStore::open(&path),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pycalc.json");

        let store = SettingsStore::open(&path).unwrap();
        assert!(!store.toggle().unwrap());

        let reopened = SettingsStore::open(&path).unwrap();
        assert!(!reopened.is_enabled());
        assert!(reopened.toggle().unwrap());
    }

    #[test]
    fn test_set_enabled_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pycalc.json");

        let store = SettingsStore::open(&path).unwrap();
        store.set_enabled(false).unwrap();
        store.set_enabled(false).unwrap();
        assert!(!SettingsStore::open(&path).unwrap().is_enabled());

        store.set_enabled(true).unwrap();
        assert!(SettingsStore::open(&path).unwrap().is_enabled());
    }

    #[test]
    fn test_heartbeat_not_shorter_than_stall_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pycalc.json");
        std::fs::write(&path, r#"{"idle_timeout_ms": 400, "stall_timeout_ms": 100}"#).unwrap();
        assert!(matches!(SettingsStore::open(&path), Err(Error::Config(_))));

        std::fs::write(&path, r#"{"idle_timeout_ms": 100, "stall_timeout_ms": 100}"#).unwrap();
        assert!(matches!(SettingsStore::open(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_stall_timeout_is_rejected() {
        let settings = Settings {
            idle_timeout_ms: 0,
            stall_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let settings = Settings {
            output_capacity: 0,
            ..Default::default()
        };
        assert_eq!(settings.output_capacity(), 1);
    }
}

//! Configuration types for torrent-inbox

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::UserId;

/// Library layout configuration (where classified torrents land)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory classified files are saved under (default: "./torrents")
    #[serde(default = "default_library_dir")]
    pub root_dir: PathBuf,

    /// Subdirectory for the movies bucket (default: "Movies")
    #[serde(default = "default_movies_subdir")]
    pub movies_subdir: String,

    /// Subdirectory for the series bucket (default: "Series")
    #[serde(default = "default_series_subdir")]
    pub series_subdir: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root_dir: default_library_dir(),
            movies_subdir: default_movies_subdir(),
            series_subdir: default_series_subdir(),
        }
    }
}

/// Batch aggregation timing configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Quiet period before the classification prompt is sent (default: 1s)
    ///
    /// A burst of uploads within this window produces exactly one prompt
    /// reflecting the final file count of the burst.
    #[serde(default = "default_debounce", with = "duration_secs")]
    pub debounce: Duration,

    /// Maximum age of an unresolved batch before it is discarded (default: 1h)
    #[serde(default = "default_ttl", with = "duration_secs")]
    pub ttl: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            ttl: default_ttl(),
        }
    }
}

/// Operational notification configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Path the health-check command writes its trigger file to
    /// (default: "/triggers/health.run")
    #[serde(default = "default_health_trigger")]
    pub health_trigger_path: PathBuf,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            health_trigger_path: default_health_trigger(),
        }
    }
}

/// Main configuration for the batch engine
///
/// Fields are organized into logical sub-configs:
/// - [`library`](LibraryConfig) — destination directories
/// - [`batch`](BatchConfig) — debounce and TTL timing
/// - [`notify`](NotifyConfig) — operational notifications
///
/// Sub-config fields are flattened so the JSON format stays un-nested.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Users allowed to send files and classify batches (at least one required)
    #[serde(default)]
    pub admin_ids: Vec<UserId>,

    /// Destination layout
    #[serde(flatten)]
    pub library: LibraryConfig,

    /// Aggregation timing
    #[serde(flatten)]
    pub batch: BatchConfig,

    /// Operational notifications
    #[serde(flatten)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Config::validate).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns a [`Error::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.admin_ids.is_empty() {
            return Err(Error::config(
                "at least one admin user id is required",
                "admin_ids",
            ));
        }
        if self.batch.debounce.is_zero() {
            return Err(Error::config("debounce must be non-zero", "debounce"));
        }
        if self.batch.ttl < self.batch.debounce {
            return Err(Error::config(
                "ttl must be at least as long as the debounce window",
                "ttl",
            ));
        }
        if self.library.movies_subdir.is_empty() || self.library.series_subdir.is_empty() {
            return Err(Error::config(
                "bucket subdirectories must be non-empty",
                "movies_subdir/series_subdir",
            ));
        }
        Ok(())
    }

    /// Whether the given user is an admin
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids.contains(&user)
    }

    /// First configured admin, the recipient of operational notices
    pub fn primary_admin(&self) -> Option<UserId> {
        self.admin_ids.first().copied()
    }
}

fn default_library_dir() -> PathBuf {
    PathBuf::from("./torrents")
}

fn default_movies_subdir() -> String {
    "Movies".to_string()
}

fn default_series_subdir() -> String {
    "Series".to_string()
}

fn default_debounce() -> Duration {
    Duration::from_secs(1)
}

fn default_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_health_trigger() -> PathBuf {
    PathBuf::from("/triggers/health.run")
}

/// Serialize durations as whole seconds so the JSON stays hand-editable
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(de)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            admin_ids: vec![UserId(1)],
            ..Default::default()
        }
    }

    #[test]
    fn default_config_has_sane_timing() {
        let config = Config::default();
        assert_eq!(config.batch.debounce, Duration::from_secs(1));
        assert_eq!(config.batch.ttl, Duration::from_secs(3600));
        assert_eq!(config.library.movies_subdir, "Movies");
        assert_eq!(config.library.series_subdir, "Series");
    }

    #[test]
    fn validate_requires_an_admin() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_ttl_shorter_than_debounce() {
        let mut config = valid_config();
        config.batch.ttl = Duration::from_millis(100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn is_admin_checks_membership() {
        let config = Config {
            admin_ids: vec![UserId(1), UserId(2)],
            ..Default::default()
        };
        assert!(config.is_admin(UserId(2)));
        assert!(!config.is_admin(UserId(3)));
        assert_eq!(config.primary_admin(), Some(UserId(1)));
    }

    #[test]
    fn from_json_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "admin_ids": [7],
                "root_dir": "/srv/torrents",
                "debounce": 2,
                "ttl": 600
            }"#,
        )
        .unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.admin_ids, vec![UserId(7)]);
        assert_eq!(config.library.root_dir, PathBuf::from("/srv/torrents"));
        assert_eq!(config.batch.debounce, Duration::from_secs(2));
        assert_eq!(config.batch.ttl, Duration::from_secs(600));
    }
}

//! Configuration module for tractstream
//!
//! This module handles session configuration:
//! - Tunables for the tract-computation and visualization workers
//! - Loading and saving session files (TOML or JSON, chosen by extension)
//! - Validation before a session starts
//!
//! # Config Location
//!
//! The demo binary looks for `session.toml` in the platform config directory
//! under `tractstream/` when no path is given:
//!
//! - **Linux**: `~/.config/tractstream/`
//! - **macOS**: `~/Library/Application Support/tractstream/`
//! - **Windows**: `%APPDATA%\tractstream\`
//!
//! # Example
//!
//! ```ignore
//! use tractstream::config::SessionConfig;
//!
//! let mut config = SessionConfig::load_or_default("session.toml");
//! config.tracking.chunk_size = 4;
//! config.validate()?;
//! config.save("session.toml")?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, TractError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "tractstream";

/// Default session config filename
pub const SESSION_CONFIG_FILE: &str = "session.toml";

/// Get the default session config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(SESSION_CONFIG_FILE))
}

/// On-disk format of a session config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            other => Err(TractError::Config(format!(
                "Unsupported config extension {:?} for {:?}",
                other, path
            ))),
        }
    }
}

/// Complete configuration of one tracking session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tract-computation worker settings
    pub tracking: TrackingConfig,
    /// Visualization worker settings
    pub visualization: VisualizationConfig,
    /// Raw-batch handoff settings
    pub handoff: HandoffConfig,
}

impl SessionConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a session config from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            TractError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: SessionConfig = match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| {
                TractError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?,
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| {
                TractError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load a session config, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path.as_ref()).unwrap_or_else(|e| {
            tracing::warn!("Failed to load session config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TractError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        std::fs::write(path, content).map_err(|e| {
            TractError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check every tunable for a usable value
    pub fn validate(&self) -> Result<()> {
        let t = &self.tracking;
        if t.chunk_size == 0 {
            return Err(TractError::Config("chunk_size must be at least 1".into()));
        }
        if t.chunk_size > MAX_CHUNK_SIZE {
            return Err(TractError::Config(format!(
                "chunk_size must be at most {}, got {}",
                MAX_CHUNK_SIZE, t.chunk_size
            )));
        }
        if !t.distance_threshold.is_finite() || t.distance_threshold <= 0.0 {
            return Err(TractError::Config(format!(
                "distance_threshold must be positive, got {}",
                t.distance_threshold
            )));
        }
        if !t.seed_offset.is_finite() {
            return Err(TractError::Config("seed_offset must be finite".into()));
        }
        if t.poll_interval_ms == 0 {
            return Err(TractError::Config(
                "tracking.poll_interval_ms must be at least 1".into(),
            ));
        }
        match t.trigger {
            TriggerMode::Distance => {}
            TriggerMode::FixedCount { total_tracts } => {
                if total_tracts == 0 {
                    return Err(TractError::Config("total_tracts must be at least 1".into()));
                }
            }
            TriggerMode::Refine {
                seed_radius,
                max_tracts,
            } => {
                if !seed_radius.is_finite() || seed_radius <= 0.0 {
                    return Err(TractError::Config(format!(
                        "seed_radius must be positive, got {}",
                        seed_radius
                    )));
                }
                if max_tracts == 0 {
                    return Err(TractError::Config("max_tracts must be at least 1".into()));
                }
            }
        }

        let v = &self.visualization;
        if v.poll_interval_ms == 0 {
            return Err(TractError::Config(
                "visualization.poll_interval_ms must be at least 1".into(),
            ));
        }
        if !v.tube_radius.is_finite() || v.tube_radius <= 0.0 {
            return Err(TractError::Config(format!(
                "tube_radius must be positive, got {}",
                v.tube_radius
            )));
        }
        if v.tube_sides < 3 || v.tube_sides > MAX_TUBE_SIDES {
            return Err(TractError::Config(format!(
                "tube_sides must be between 3 and {}, got {}",
                MAX_TUBE_SIDES, v.tube_sides
            )));
        }

        let capacity = self.handoff.capacity;
        if capacity == 0 || capacity > MAX_HANDOFF_CAPACITY {
            return Err(TractError::Config(format!(
                "handoff.capacity must be between 1 and {}, got {}",
                MAX_HANDOFF_CAPACITY, capacity
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let mut config = SessionConfig::default();
        config.tracking.chunk_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_validate_rejects_oversized_chunk() {
        let mut config = SessionConfig::default();
        config.tracking.chunk_size = MAX_CHUNK_SIZE;
        assert!(config.validate().is_ok());

        config.tracking.chunk_size = usize::MAX;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TractError::Config(_)));
        assert!(err.to_string().contains("chunk_size must be at most"));
    }

    #[test]
    fn test_validate_handoff_capacity_bounds() {
        let mut config = SessionConfig::default();
        config.handoff.capacity = 0;
        assert!(config.validate().is_err());

        config.handoff.capacity = MAX_HANDOFF_CAPACITY;
        assert!(config.validate().is_ok());

        config.handoff.capacity = usize::MAX;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TractError::Config(_)));
        assert!(err.to_string().contains("handoff.capacity"));
    }

    #[test]
    fn test_validate_rejects_non_positive_threshold() {
        let mut config = SessionConfig::default();
        config.tracking.distance_threshold = 0.0;
        assert!(config.validate().is_err());

        config.tracking.distance_threshold = -1.0;
        assert!(config.validate().is_err());

        config.tracking.distance_threshold = f64::INFINITY;
        assert!(config.validate().is_err());

        config.tracking.distance_threshold = 0.1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tube() {
        let mut config = SessionConfig::default();
        config.visualization.tube_sides = 2;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.visualization.tube_radius = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.visualization.tube_sides = MAX_TUBE_SIDES + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_refine() {
        let mut config = SessionConfig::default();
        config.tracking.trigger = TriggerMode::Refine {
            seed_radius: 0.0,
            max_tracts: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SessionConfig = toml::from_str(
            r#"
            [tracking]
            chunk_size = 4

            [tracking.trigger]
            mode = "fixed_count"
            total_tracts = 24
            "#,
        )
        .unwrap();

        assert_eq!(config.tracking.chunk_size, 4);
        assert_eq!(config.tracking.distance_threshold, DEFAULT_DISTANCE_THRESHOLD);
        assert_eq!(
            config.tracking.trigger,
            TriggerMode::FixedCount { total_tracts: 24 }
        );
        assert_eq!(config.visualization, VisualizationConfig::default());
        assert_eq!(config.handoff.capacity, DEFAULT_HANDOFF_CAPACITY);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = SessionConfig::default().save("session.yaml").unwrap_err();
        assert!(err.to_string().contains("Unsupported config extension"));
    }

    #[test]
    fn test_default_config_path_names_app() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("tractstream/session.toml"));
        }
    }
}

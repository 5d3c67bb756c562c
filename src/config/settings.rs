//! Tunable settings for the two pipeline workers
//!
//! # Main Types
//!
//! - [`TrackingConfig`] - Chunk size, hysteresis, seed offset and trigger mode
//! - [`TriggerMode`] - When an accepted pose turns into engine requests
//! - [`VisualizationConfig`] - Render cadence and tube cross-section
//! - [`HandoffConfig`] - Capacity of the raw-batch queue between workers
//!
//! The distance threshold and the seed offset are empirical defaults carried
//! over from navigation sessions; neither is an invariant of the pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of stochastic samples requested per seed
pub const DEFAULT_CHUNK_SIZE: usize = 6;

/// Default probe displacement required before a new request is issued
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 3.0;

/// Default tract worker poll interval in milliseconds
pub const DEFAULT_TRACT_POLL_MS: u64 = 20;

/// Default visualization refresh interval in milliseconds
pub const DEFAULT_VIZ_POLL_MS: u64 = 50;

/// Default tube radius
pub const DEFAULT_TUBE_RADIUS: f64 = 0.5;

/// Default tube side count
pub const DEFAULT_TUBE_SIDES: usize = 4;

/// Default capacity of the raw-batch handoff queue
pub const DEFAULT_HANDOFF_CAPACITY: usize = 4;

/// Largest accepted `chunk_size`; every chunk allocates one seed per sample
pub const MAX_CHUNK_SIZE: usize = 4096;

/// Largest accepted handoff queue depth
pub const MAX_HANDOFF_CAPACITY: usize = 1024;

/// Largest accepted tube side count
pub const MAX_TUBE_SIDES: usize = 256;

/// When the tract worker turns an accepted pose into engine requests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TriggerMode {
    /// One chunked request each time the probe moves past the distance threshold
    #[default]
    Distance,
    /// Several chunked requests per accepted pose, until `total_tracts` are attempted
    FixedCount {
        /// Tracts to attempt for each accepted pose
        total_tracts: usize,
    },
    /// Keep densifying the bundle while the probe stays near its anchor
    Refine {
        /// Moving this far from the anchor starts a new bundle
        seed_radius: f64,
        /// Attempted tracts after which a stationary bundle stops growing
        max_tracts: usize,
    },
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerMode::Distance => write!(f, "distance"),
            TriggerMode::FixedCount { total_tracts } => {
                write!(f, "fixed count ({} tracts)", total_tracts)
            }
            TriggerMode::Refine {
                seed_radius,
                max_tracts,
            } => write!(f, "refine (radius {}, up to {} tracts)", seed_radius, max_tracts),
        }
    }
}

/// Settings for the tract-computation worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Seeds per engine request (copies of the same seed point)
    pub chunk_size: usize,
    /// Minimum probe displacement before a new request
    pub distance_threshold: f64,
    /// Distance the seed is moved back along the probe axis
    pub seed_offset: f64,
    /// Idle sleep between pose checks in milliseconds
    pub poll_interval_ms: u64,
    /// Request trigger
    pub trigger: TriggerMode,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            seed_offset: 0.0,
            poll_interval_ms: DEFAULT_TRACT_POLL_MS,
            trigger: TriggerMode::Distance,
        }
    }
}

impl TrackingConfig {
    /// Poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Number of chunked requests issued for one accepted pose
    pub fn chunks_per_pose(&self) -> usize {
        match self.trigger {
            TriggerMode::FixedCount { total_tracts } => {
                (total_tracts / self.chunk_size.max(1)).max(1)
            }
            _ => 1,
        }
    }
}

/// Settings for the visualization worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Refresh interval in milliseconds
    pub poll_interval_ms: u64,
    /// Tube cross-section radius
    pub tube_radius: f64,
    /// Tube cross-section side count
    pub tube_sides: usize,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_VIZ_POLL_MS,
            tube_radius: DEFAULT_TUBE_RADIUS,
            tube_sides: DEFAULT_TUBE_SIDES,
        }
    }
}

impl VisualizationConfig {
    /// Refresh interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Settings for the raw-batch handoff between the workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Queued batches before the oldest is dropped; 1 keeps only the latest
    pub capacity: usize,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HANDOFF_CAPACITY,
        }
    }
}

//! Core data types for tractstream
//!
//! This module contains the data that flows between the pose source, the
//! two workers and the rendering sink.
//!
//! # Main Types
//!
//! - [`Pose`] - A probe position plus optional orientation matrix
//! - [`Streamline`] - One traced fiber path in tracker space
//! - [`Rgb`] - A per-point direction color
//! - [`TractBatch`] - The streamlines from one engine request, with reserved slots
//! - [`PipelineStats`] - Running counters for a session

use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};

/// One direction color, red/green/blue bytes
pub type Rgb = [u8; 3];

/// A probe pose captured by the external acquisition source
///
/// Poses are immutable once captured and are superseded, never merged,
/// by the next arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Probe position in world coordinates
    pub position: Point3<f64>,
    /// Coregistered probe matrix (orientation + translation), if known
    pub matrix: Option<Matrix4<f64>>,
}

impl Pose {
    /// Create a pose from a bare position (no orientation correction)
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            matrix: None,
        }
    }

    /// Create a pose from a position and its coregistered matrix
    pub fn with_matrix(position: Point3<f64>, matrix: Matrix4<f64>) -> Self {
        Self {
            position,
            matrix: Some(matrix),
        }
    }

    /// Convenience constructor from raw coordinates
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// An ordered sequence of points traced by the tracking engine
///
/// An empty streamline stands for a seed the engine could not track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streamline {
    points: Vec<Point3<f64>>,
}

impl Streamline {
    /// Create a streamline from its points
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// A streamline for a seed the engine could not track
    pub fn miss() -> Self {
        Self::default()
    }

    /// Points of the streamline, in tracing order
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the engine returned nothing for this seed
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the streamline has a defined direction (at least 2 points)
    pub fn is_traceable(&self) -> bool {
        self.points.len() >= 2
    }
}

impl From<Vec<Point3<f64>>> for Streamline {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self::new(points)
    }
}

impl From<Vec<[f64; 3]>> for Streamline {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points.into_iter().map(Point3::from).collect())
    }
}

impl FromIterator<Point3<f64>> for Streamline {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Raw streamlines from a single engine request, handed from the
/// tract-computation worker to the visualization worker
#[derive(Debug, Clone, PartialEq)]
pub struct TractBatch {
    /// Session generation the request was issued in
    pub generation: u64,
    /// First composite slot reserved for this batch
    pub first_slot: usize,
    /// Number of seeds sent to the engine
    pub requested: usize,
    /// Streamlines returned by the engine, in request order
    pub streamlines: Vec<Streamline>,
}

impl TractBatch {
    /// Number of composite slots this batch consumes
    ///
    /// Slots follow the attempted seeds, not the successes, so a batch of
    /// misses still reserves its indices.
    pub fn slot_span(&self) -> usize {
        self.requested.max(self.streamlines.len())
    }

    /// Number of streamlines that can be meshed
    pub fn traceable_count(&self) -> usize {
        self.streamlines.iter().filter(|s| s.is_traceable()).count()
    }
}

/// Running counters for one pipeline session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Poses written by the pose source
    pub poses_received: u64,
    /// Poses overwritten before the tract worker consumed them
    pub poses_superseded: u64,
    /// Poses that passed movement hysteresis and produced a request
    pub poses_accepted: u64,
    /// Poses taken by the tract worker that produced no request
    pub poses_skipped: u64,
    /// Calls made to the tracking engine
    pub engine_requests: u64,
    /// Seeds sent to the tracking engine
    pub tracts_requested: u64,
    /// Non-empty streamlines returned by the tracking engine
    pub tracts_returned: u64,
    /// Seeds for which the engine returned nothing
    pub engine_misses: u64,
    /// Batches handed to the visualization worker
    pub batches_published: u64,
    /// Batches lost because the handoff queue was full
    pub batches_dropped: u64,
    /// Batches discarded because the session was reset under them
    pub batches_stale: u64,
    /// Tube meshes built
    pub meshes_built: u64,
    /// Streamlines too short to mesh
    pub degenerate_skipped: u64,
    /// Composite snapshots sent to the rendering sink
    pub snapshots_published: u64,
    /// Session resets (new target or new refine bundle)
    pub resets: u64,
}

impl PipelineStats {
    /// Fraction of requested seeds that produced a streamline, as a percentage
    pub fn hit_rate(&self) -> f64 {
        if self.tracts_requested == 0 {
            100.0
        } else {
            (self.tracts_returned as f64 / self.tracts_requested as f64) * 100.0
        }
    }
}

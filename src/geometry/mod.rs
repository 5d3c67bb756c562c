//! Pure geometry stages of the pipeline
//!
//! - [`seed`] - World pose to tracker-space seed, plus movement hysteresis
//! - [`direction`] - Per-point direction colors for a streamline
//! - [`tube`] - Tube mesh swept along a colored streamline
//!
//! Nothing in here touches shared state.

pub mod direction;
pub mod seed;
pub mod tube;

pub use direction::simple_direction;
pub use seed::{compute_seed, probe_position, AffineTransform, MovementGate};
pub use tube::{build_tube, tube_for_streamline, TubeMesh, TubeParams};

//! # tractstream: real-time fiber-tract visualization
//!
//! Turns a stream of probe poses into a growing bundle of tube meshes. A
//! probabilistic tracking engine is seeded at the probe tip whenever the
//! probe moves far enough, and every streamline it returns is swept into a
//! direction-colored tube and added to a composite scene for display.
//!
//! ## Architecture
//!
//! - **Geometry**: Seed transform, direction colors and tube meshing (pure functions)
//! - **Engine**: The [`TrackingEngine`] trait plus a simulated tracker
//! - **Scene**: Slot-indexed composite, snapshots and rendering sinks
//! - **Pipeline**: Shared state, the two worker threads and the session handle
//!
//! ## Configuration
//!
//! Session tunables live in a TOML (or JSON) file; see [`config`]. The demo
//! binary reads `session.toml` from the platform config directory under
//! `tractstream/` when no path is given.
//!
//! ## Example
//!
//! ```ignore
//! use tractstream::{
//!     config::SessionConfig,
//!     engine::{SimulatedEngine, SimulatedEngineConfig},
//!     pipeline::SessionBuilder,
//!     scene::ChannelSink,
//!     types::Pose,
//! };
//!
//! let (sink, frames) = ChannelSink::new(8);
//! let engine = SimulatedEngine::new(SimulatedEngineConfig::default());
//! let session = SessionBuilder::new(engine, affine, sink)
//!     .config(SessionConfig::load_or_default("session.toml"))
//!     .start()?;
//!
//! session.write_pose(Pose::at(12.0, 40.5, 18.0))?;
//! if let Some(frame) = tractstream::scene::latest_frame(&frames) {
//!     println!("{} tubes", frame.snapshot.populated());
//! }
//! let stats = session.stop()?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod scene;
pub mod types;

// Re-export commonly used types
pub use config::SessionConfig;
pub use engine::TrackingEngine;
pub use error::{Result, TractError};
pub use pipeline::{PoseSender, SessionBuilder, TractSession};
pub use scene::{ChannelSink, RenderSink, SceneSnapshot};
pub use types::{PipelineStats, Pose, Streamline};

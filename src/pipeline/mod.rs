//! Two-stage tract pipeline.
//!
//! Poses flow from an acquisition source to the tract-computation worker,
//! raw streamlines flow from there to the visualization worker, and
//! composite snapshots flow out to a rendering sink. Each worker runs on
//! its own thread and the two only meet in [`PipelineState`].
//!
//! # Architecture
//!
//! ```text
//! [pose source] ──write_pose──► PipelineState ──try_take_pose──► [tract-compute]
//!                                   ▲                                  │
//!                                   └──────────write_tracts────────────┘
//!                                   │
//!                          try_take_tracts
//!                                   ▼
//!                          [tract-visualize] ──snapshot──► RenderSink
//! ```
//!
//! # Design
//!
//! - **Latest pose wins**: the tract worker only ever sees the newest pose.
//! - **Bounded handoff**: raw batches queue up to a fixed depth, oldest dropped.
//! - **Stable slots**: composite indices are reserved at publish time.
//! - **Cooperative stop**: workers exit at idle boundaries, never mid-request.

pub mod session;
pub mod shared_state;
pub mod tract_worker;
pub mod viz_worker;

pub use session::{PoseSender, SessionBuilder, TractSession, TRACT_THREAD_NAME, VIZ_THREAD_NAME};
pub use shared_state::PipelineState;
pub use tract_worker::TractWorker;
pub use viz_worker::VisualizationWorker;

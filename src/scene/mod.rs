//! Composite scene and rendering sinks
//!
//! - [`CompositeScene`] / [`accumulate`] - Append-only, slot-indexed tube collection
//! - [`SceneSnapshot`] - Immutable view handed to the renderer
//! - [`RenderSink`] / [`ChannelSink`] - Where snapshots go
//!
//! The composite is owned by the visualization worker alone, so it carries
//! no lock.

pub mod composite;
pub mod sink;

pub use composite::{accumulate, CompositeScene, SceneSnapshot};
pub use sink::{latest_frame, ChannelSink, RenderSink, SceneFrame};

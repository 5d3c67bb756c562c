//! Session lifecycle: start both workers, feed poses, reset, stop.
//!
//! A session is started from a [`SessionBuilder`] and owns two named
//! threads plus the [`PipelineState`] they share. Poses go in through
//! [`TractSession::write_pose`] or a cloned [`PoseSender`]; snapshots come
//! out through the [`RenderSink`] given to the builder.
//!
//! ```ignore
//! let (sink, frames) = ChannelSink::new(8);
//! let session = SessionBuilder::new(engine, affine, sink)
//!     .config(config)
//!     .world_transform(flip_x)
//!     .start()?;
//!
//! session.write_pose(Pose::at(10.0, 4.0, 2.5))?;
//! // ...
//! let stats = session.stop()?;
//! ```

use super::shared_state::PipelineState;
use super::tract_worker::TractWorker;
use super::viz_worker::VisualizationWorker;
use crate::config::SessionConfig;
use crate::engine::TrackingEngine;
use crate::error::{Result, ResultExt, TractError};
use crate::geometry::AffineTransform;
use crate::scene::RenderSink;
use crate::types::{PipelineStats, Pose};
use nalgebra::{Matrix4, Point3};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Thread name of the tract-computation worker
pub const TRACT_THREAD_NAME: &str = "tract-compute";

/// Thread name of the visualization worker
pub const VIZ_THREAD_NAME: &str = "tract-visualize";

/// Collects everything needed to start a session
pub struct SessionBuilder {
    engine: Box<dyn TrackingEngine>,
    affine: Matrix4<f64>,
    sink: Box<dyn RenderSink>,
    world_transform: Matrix4<f64>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a builder with default config and an identity world transform
    pub fn new(
        engine: impl TrackingEngine + 'static,
        affine: Matrix4<f64>,
        sink: impl RenderSink + 'static,
    ) -> Self {
        Self {
            engine: Box::new(engine),
            affine,
            sink: Box::new(sink),
            world_transform: Matrix4::identity(),
            config: SessionConfig::default(),
        }
    }

    /// Use these tunables
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Transform applied by the renderer to every snapshot
    pub fn world_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.world_transform = transform;
        self
    }

    /// Validate inputs and spawn both workers
    pub fn start(self) -> Result<TractSession> {
        self.config.validate().context("Invalid session config")?;
        let affine = AffineTransform::new(self.affine)?;

        let state = PipelineState::new(self.config.handoff.capacity);
        let mut tract_worker =
            TractWorker::new(state.clone(), self.engine, affine, self.config.tracking.clone());
        let mut viz_worker = VisualizationWorker::new(
            state.clone(),
            self.sink,
            self.world_transform,
            &self.config.visualization,
        );

        let tract_handle = thread::Builder::new()
            .name(TRACT_THREAD_NAME.into())
            .spawn(move || tract_worker.run())?;

        let viz_handle = match thread::Builder::new()
            .name(VIZ_THREAD_NAME.into())
            .spawn(move || viz_worker.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                state.request_stop();
                let _ = tract_handle.join();
                return Err(e.into());
            }
        };

        tracing::info!(
            "Tract session started (chunk size {}, {} trigger)",
            self.config.tracking.chunk_size,
            self.config.tracking.trigger
        );

        Ok(TractSession {
            state,
            tract_handle: Some(tract_handle),
            viz_handle: Some(viz_handle),
        })
    }
}

/// Cloneable handle for an acquisition thread to push poses
#[derive(Clone)]
pub struct PoseSender {
    state: Arc<PipelineState>,
}

impl PoseSender {
    /// Publish the latest pose, replacing any the worker has not taken yet
    pub fn send(&self, pose: Pose) -> Result<()> {
        if self.state.is_stop_requested() {
            return Err(TractError::SessionStopped);
        }
        self.state.write_pose(pose);
        Ok(())
    }

    /// Publish a position and optional probe matrix
    pub fn submit(&self, position: Point3<f64>, matrix: Option<Matrix4<f64>>) -> Result<()> {
        self.send(Pose { position, matrix })
    }
}

/// A running pipeline session
pub struct TractSession {
    state: Arc<PipelineState>,
    tract_handle: Option<JoinHandle<()>>,
    viz_handle: Option<JoinHandle<()>>,
}

impl TractSession {
    /// Publish the latest pose
    pub fn write_pose(&self, pose: Pose) -> Result<()> {
        self.pose_sender().send(pose)
    }

    /// Handle for publishing poses from another thread
    pub fn pose_sender(&self) -> PoseSender {
        PoseSender {
            state: self.state.clone(),
        }
    }

    /// Start over for a new target: empty composite, slots from 0.
    ///
    /// Returns the new generation.
    pub fn reset(&self) -> Result<u64> {
        if self.state.is_stop_requested() {
            return Err(TractError::SessionStopped);
        }
        Ok(self.state.reset())
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    /// Snapshot of the running counters
    pub fn stats(&self) -> PipelineStats {
        self.state.stats()
    }

    /// Check if both workers are still running
    pub fn is_running(&self) -> bool {
        let alive = |h: &Option<JoinHandle<()>>| h.as_ref().is_some_and(|h| !h.is_finished());
        !self.state.is_stop_requested() && alive(&self.tract_handle) && alive(&self.viz_handle)
    }

    /// Ask both workers to stop, wait for them and return the final counters
    pub fn stop(mut self) -> Result<PipelineStats> {
        self.shutdown()?;
        let stats = self.state.stats();
        tracing::info!(
            "Tract session stopped: {} requests, {} tracts, {} snapshots, {} dropped",
            stats.engine_requests,
            stats.tracts_returned,
            stats.snapshots_published,
            stats.batches_dropped
        );
        Ok(stats)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.state.request_stop();

        let mut result = Ok(());
        for (name, handle) in [
            (TRACT_THREAD_NAME, self.tract_handle.take()),
            (VIZ_THREAD_NAME, self.viz_handle.take()),
        ] {
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    tracing::error!("Worker '{}' panicked", name);
                    result = Err(TractError::WorkerPanicked(name.to_string()));
                }
            }
        }
        result
    }
}

impl Drop for TractSession {
    fn drop(&mut self) {
        if self.tract_handle.is_some() || self.viz_handle.is_some() {
            let _ = self.shutdown();
        }
    }
}

//! Visualization worker
//!
//! Runs on its own thread. Each tick it drains every raw batch waiting in
//! the pipeline state, meshes the streamlines, appends the tubes to the
//! composite at their reserved slots and hands one snapshot to the
//! rendering sink. The composite lives here and nowhere else.

use super::shared_state::PipelineState;
use crate::config::VisualizationConfig;
use crate::geometry::{tube_for_streamline, TubeParams};
use crate::scene::{accumulate, CompositeScene, RenderSink};
use crate::types::TractBatch;
use nalgebra::Matrix4;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Worker that meshes raw batches and publishes composite snapshots
pub struct VisualizationWorker {
    state: Arc<PipelineState>,
    sink: Box<dyn RenderSink>,
    world_transform: Matrix4<f64>,
    params: TubeParams,
    poll_interval: Duration,
    scene: CompositeScene,
    last_poll_time: Instant,
}

impl VisualizationWorker {
    /// Create a new visualization worker
    pub fn new(
        state: Arc<PipelineState>,
        sink: Box<dyn RenderSink>,
        world_transform: Matrix4<f64>,
        config: &VisualizationConfig,
    ) -> Self {
        let scene = CompositeScene::for_generation(state.generation());
        Self {
            state,
            sink,
            world_transform,
            params: TubeParams {
                radius: config.tube_radius,
                sides: config.tube_sides,
            },
            poll_interval: config.poll_interval(),
            scene,
            last_poll_time: Instant::now(),
        }
    }

    /// Run the main worker loop until stop is requested
    pub fn run(&mut self) {
        tracing::info!(
            "Visualization worker started (radius {}, {} sides)",
            self.params.radius,
            self.params.sides
        );

        while !self.state.is_stop_requested() {
            self.tick();
            self.rate_limit();
        }

        tracing::info!(
            "Visualization worker stopped ({} tubes in scene)",
            self.scene.populated()
        );
    }

    /// Consume everything pending and publish at most one snapshot.
    ///
    /// Returns true if a snapshot was published.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.follow_generation(self.state.generation());

        while let Some(batch) = self.state.try_take_tracts() {
            if batch.generation < self.scene.generation() {
                self.state.record(|s| s.batches_stale += 1);
                continue;
            }
            changed |= self.follow_generation(batch.generation);
            changed |= self.render_batch(batch);
        }

        if changed {
            self.publish();
        }
        changed
    }

    /// Composite owned by this worker
    pub fn scene(&self) -> &CompositeScene {
        &self.scene
    }

    /// Clear the composite when the session moved to a newer generation
    fn follow_generation(&mut self, generation: u64) -> bool {
        if generation <= self.scene.generation() {
            return false;
        }
        tracing::debug!(
            "Clearing composite ({} tubes) for generation {}",
            self.scene.populated(),
            generation
        );
        self.scene.reset(generation);
        true
    }

    /// Mesh one batch into the composite. Returns true if any tube was added.
    fn render_batch(&mut self, batch: TractBatch) -> bool {
        let params = self.params;
        let tubes: Vec<_> = batch
            .streamlines
            .iter()
            .map(|s| tube_for_streamline(s, &params))
            .collect();

        let built = tubes.iter().filter(|t| t.is_some()).count() as u64;
        let degenerate = batch
            .streamlines
            .iter()
            .filter(|s| !s.is_empty() && !s.is_traceable())
            .count() as u64;
        self.state.record(|s| {
            s.meshes_built += built;
            s.degenerate_skipped += degenerate;
        });

        let before = self.scene.revision();
        accumulate(&mut self.scene, tubes, batch.first_slot);
        tracing::trace!(
            "Batch at slot {}: {} tubes, composite now {}",
            batch.first_slot,
            built,
            self.scene.populated()
        );
        self.scene.revision() != before
    }

    fn publish(&mut self) {
        self.sink.present(self.scene.snapshot(), &self.world_transform);
        self.state.record(|s| s.snapshots_published += 1);
    }

    /// Sleep out the rest of the poll interval
    fn rate_limit(&mut self) {
        let elapsed = self.last_poll_time.elapsed();

        if elapsed < self.poll_interval {
            std::thread::sleep(self.poll_interval - elapsed);
        }

        self.last_poll_time = Instant::now();
    }
}

//! Tract-computation worker
//!
//! Runs on its own thread. Each cycle it takes the newest pose (if any),
//! applies the trigger policy, converts the probe position to a tracker
//! seed and asks the engine for `chunk_size` samples from that seed. The
//! raw result goes to the visualization worker through [`PipelineState`].
//!
//! The worker owns the engine and the movement gate; nothing here is
//! shared except through the pipeline state.

use super::shared_state::PipelineState;
use crate::config::{TrackingConfig, TriggerMode};
use crate::engine::{track, TrackingEngine};
use crate::geometry::{probe_position, AffineTransform, MovementGate};
use crate::types::Pose;
use nalgebra::Point3;
use std::sync::Arc;
use std::time::Instant;

/// Worker that turns accepted poses into engine requests
pub struct TractWorker {
    state: Arc<PipelineState>,
    engine: Box<dyn TrackingEngine>,
    affine: AffineTransform,
    config: TrackingConfig,
    /// Last accepted probe position (or refine anchor)
    gate: MovementGate,
    /// Generation the worker believes is current
    generation: u64,
    /// Seeds attempted in the current refine bundle
    bundle_attempted: usize,
    last_poll_time: Instant,
}

impl TractWorker {
    /// Create a new tract worker
    pub fn new(
        state: Arc<PipelineState>,
        engine: Box<dyn TrackingEngine>,
        affine: AffineTransform,
        config: TrackingConfig,
    ) -> Self {
        let generation = state.generation();
        Self {
            state,
            engine,
            affine,
            gate: MovementGate::new(config.distance_threshold),
            config,
            generation,
            bundle_attempted: 0,
            last_poll_time: Instant::now(),
        }
    }

    /// Run the main worker loop until stop is requested
    pub fn run(&mut self) {
        tracing::info!(
            "Tract worker started ({} trigger, chunk size {})",
            self.config.trigger,
            self.config.chunk_size
        );

        while !self.state.is_stop_requested() {
            self.step();
            self.rate_limit();
        }

        tracing::info!("Tract worker stopped");
    }

    /// Run one idle → active → idle cycle.
    ///
    /// Returns the number of engine requests issued.
    pub fn step(&mut self) -> usize {
        match self.state.take_pose_with_generation() {
            Some((pose, generation)) => {
                self.sync_generation(generation);
                self.handle_pose(&pose)
            }
            None => {
                self.sync_generation(self.state.generation());
                0
            }
        }
    }

    /// Last accepted probe position
    pub fn last_position(&self) -> Option<Point3<f64>> {
        self.gate.last()
    }

    /// Forget the gate after an external reset
    fn sync_generation(&mut self, current: u64) {
        if current != self.generation {
            tracing::debug!(
                "Tract worker following reset: generation {} -> {}",
                self.generation,
                current
            );
            self.generation = current;
            self.gate.reset();
            self.bundle_attempted = 0;
        }
    }

    fn handle_pose(&mut self, pose: &Pose) -> usize {
        let position = probe_position(pose, self.config.seed_offset);

        match self.config.trigger {
            TriggerMode::Distance => {
                if !self.gate.accept(position) {
                    return self.skip(&position);
                }
                self.request_chunks(position, 1)
            }
            TriggerMode::FixedCount { .. } => {
                if !self.gate.accept(position) {
                    return self.skip(&position);
                }
                self.request_chunks(position, self.config.chunks_per_pose())
            }
            TriggerMode::Refine {
                seed_radius,
                max_tracts,
            } => match self.gate.distance(&position) {
                None => {
                    self.gate.accept(position);
                    self.bundle_attempted = 0;
                    self.request_chunks(position, 1)
                }
                Some(d) if d >= seed_radius => {
                    tracing::debug!("Probe moved {:.2} from anchor, starting new bundle", d);
                    self.generation = self.state.begin_new_bundle();
                    self.gate.reset();
                    self.gate.accept(position);
                    self.bundle_attempted = 0;
                    self.request_chunks(position, 1)
                }
                Some(_) if self.bundle_attempted < max_tracts => self.request_chunks(position, 1),
                Some(_) => {
                    tracing::trace!("Bundle complete ({} tracts), waiting for movement", max_tracts);
                    self.skip(&position)
                }
            },
        }
    }

    fn skip(&self, position: &Point3<f64>) -> usize {
        tracing::trace!("Pose at {:?} skipped", position);
        self.state.record(|s| s.poses_skipped += 1);
        0
    }

    /// Issue up to `chunks` engine requests seeded at `position`.
    ///
    /// Stop is checked between chunks, never during an engine call.
    fn request_chunks(&mut self, position: Point3<f64>, chunks: usize) -> usize {
        self.state.record(|s| s.poses_accepted += 1);

        let seed = self.affine.to_tracker(&position);
        let seeds = vec![seed; self.config.chunk_size];

        let mut issued = 0;
        for chunk in 0..chunks {
            if chunk > 0 && self.state.is_stop_requested() {
                tracing::debug!("Stop requested after {}/{} chunks", chunk, chunks);
                break;
            }
            self.issue_request(&seeds);
            issued += 1;
        }
        issued
    }

    fn issue_request(&mut self, seeds: &[Point3<f64>]) {
        let started = Instant::now();
        let streamlines = track(self.engine.as_mut(), seeds);

        let requested = seeds.len();
        let returned = streamlines.iter().filter(|s| !s.is_empty()).count();
        self.bundle_attempted += requested;
        self.state.record(|s| {
            s.engine_requests += 1;
            s.tracts_requested += requested as u64;
            s.tracts_returned += returned as u64;
            s.engine_misses += requested.saturating_sub(returned) as u64;
        });

        match self.state.write_tracts(self.generation, requested, streamlines) {
            Some(first_slot) => tracing::debug!(
                "Engine returned {}/{} tracts in {:?} (slots {}..{})",
                returned,
                requested,
                started.elapsed(),
                first_slot,
                first_slot + requested
            ),
            None => tracing::debug!("Session reset during engine call, result discarded"),
        }
    }

    /// Sleep out the rest of the poll interval
    fn rate_limit(&mut self) {
        let target_interval = self.config.poll_interval();
        let elapsed = self.last_poll_time.elapsed();

        if elapsed < target_interval {
            std::thread::sleep(target_interval - elapsed);
        }

        self.last_poll_time = Instant::now();
    }
}

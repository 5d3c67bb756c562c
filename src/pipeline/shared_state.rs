//! Shared state between the pose source and the two pipeline workers.
//!
//! `PipelineState` is the only structure touched by more than one thread.
//! Callers go through `write_pose` / `try_take_pose` and `write_tracts` /
//! `try_take_tracts`; every lock stays inside this module.
//!
//! # Ordering
//!
//! - Poses are last-write-wins. A pose overwritten before the tract worker
//!   took it is counted as superseded and never processed.
//! - Raw batches go through a bounded FIFO. When it is full the oldest
//!   batch is dropped, counted and logged. Capacity 1 keeps only the latest.
//! - Composite slots are reserved when a batch is published, in publish
//!   order, so a dropped batch leaves its slots empty instead of shifting
//!   later tracts.
//!
//! # Generations
//!
//! A reset bumps the generation, forgets the pending pose (session reset
//! only), discards queued batches and restarts slot numbering. Batches
//! published for an older generation are refused.

use crate::types::{PipelineStats, Pose, Streamline, TractBatch};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Handoff {
    capacity: usize,
    generation: u64,
    next_slot: usize,
    queue: VecDeque<TractBatch>,
}

/// Mailbox shared by the pose source, the tract worker and the
/// visualization worker for the lifetime of one session.
#[derive(Debug)]
pub struct PipelineState {
    /// Latest pose not yet taken by the tract worker.
    pose: Mutex<Option<Pose>>,

    /// Raw-batch queue plus the running slot total.
    /// Written by the tract worker, drained by the visualization worker.
    handoff: Mutex<Handoff>,

    stats: Mutex<PipelineStats>,

    /// Mirror of the handoff generation for lock-free reads.
    generation: AtomicU64,

    /// Session stop flag, checked by both workers at each idle boundary.
    stop_requested: AtomicBool,
}

impl PipelineState {
    /// Create a new shared state with the given handoff capacity.
    pub fn new(handoff_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            pose: Mutex::new(None),
            handoff: Mutex::new(Handoff {
                capacity: handoff_capacity.max(1),
                generation: 0,
                next_slot: 0,
                queue: VecDeque::new(),
            }),
            stats: Mutex::new(PipelineStats::default()),
            generation: AtomicU64::new(0),
            stop_requested: AtomicBool::new(false),
        })
    }

    // ==================== Poses ====================

    /// Store the latest pose, replacing any pose not yet consumed.
    pub fn write_pose(&self, pose: Pose) {
        let superseded = self.pose.lock().replace(pose).is_some();
        let mut stats = self.stats.lock();
        stats.poses_received += 1;
        if superseded {
            stats.poses_superseded += 1;
        }
    }

    /// Take the pending pose, if a new one arrived since the last take.
    pub fn try_take_pose(&self) -> Option<Pose> {
        self.pose.lock().take()
    }

    /// Take the pending pose together with the generation it belongs to.
    ///
    /// `reset` holds the pose lock while it bumps the generation, so a pose
    /// written after a reset is never paired with the older generation.
    pub fn take_pose_with_generation(&self) -> Option<(Pose, u64)> {
        let mut pose = self.pose.lock();
        let taken = pose.take()?;
        Some((taken, self.generation()))
    }

    /// Check if a pose is waiting.
    pub fn has_pending_pose(&self) -> bool {
        self.pose.lock().is_some()
    }

    // ==================== Raw batches ====================

    /// Publish the streamlines from one engine request.
    ///
    /// Reserves `max(requested, streamlines.len())` slots starting at the
    /// running total and returns the first one. Returns `None` when the
    /// request belongs to an older generation; the batch is discarded.
    pub fn write_tracts(
        &self,
        generation: u64,
        requested: usize,
        streamlines: Vec<Streamline>,
    ) -> Option<usize> {
        let mut handoff = self.handoff.lock();
        if generation != handoff.generation {
            drop(handoff);
            self.stats.lock().batches_stale += 1;
            tracing::debug!(
                "Discarding batch from generation {} (current {})",
                generation,
                self.generation()
            );
            return None;
        }

        let batch = TractBatch {
            generation,
            first_slot: handoff.next_slot,
            requested,
            streamlines,
        };
        let first_slot = batch.first_slot;
        handoff.next_slot += batch.slot_span();

        let mut dropped = None;
        if handoff.queue.len() >= handoff.capacity {
            dropped = handoff.queue.pop_front();
        }
        handoff.queue.push_back(batch);
        drop(handoff);

        let mut stats = self.stats.lock();
        stats.batches_published += 1;
        if let Some(lost) = dropped {
            stats.batches_dropped += 1;
            tracing::warn!(
                "Visualization lagging: dropped unconsumed batch at slots {}..{} ({} dropped so far)",
                lost.first_slot,
                lost.first_slot + lost.slot_span(),
                stats.batches_dropped
            );
        }

        Some(first_slot)
    }

    /// Take the oldest unconsumed batch.
    pub fn try_take_tracts(&self) -> Option<TractBatch> {
        self.handoff.lock().queue.pop_front()
    }

    /// Number of batches waiting for the visualization worker.
    pub fn pending_batches(&self) -> usize {
        self.handoff.lock().queue.len()
    }

    /// Slots reserved so far in the current generation.
    pub fn total_tracts(&self) -> usize {
        self.handoff.lock().next_slot
    }

    // ==================== Generations ====================

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset the session: new generation, no pending pose, empty queue,
    /// slot numbering from 0. Returns the new generation.
    pub fn reset(&self) -> u64 {
        let mut pose = self.pose.lock();
        let generation = self.advance_generation();
        pose.take();
        generation
    }

    /// Start a new bundle without touching the pending pose.
    /// Returns the new generation.
    pub fn begin_new_bundle(&self) -> u64 {
        self.advance_generation()
    }

    fn advance_generation(&self) -> u64 {
        let mut handoff = self.handoff.lock();
        handoff.generation += 1;
        handoff.next_slot = 0;
        let discarded = handoff.queue.len() as u64;
        handoff.queue.clear();
        let generation = handoff.generation;
        self.generation.store(generation, Ordering::SeqCst);
        drop(handoff);

        let mut stats = self.stats.lock();
        stats.resets += 1;
        stats.batches_stale += discarded;
        tracing::info!("Pipeline reset to generation {}", generation);
        generation
    }

    // ==================== Stats ====================

    /// Snapshot of the running counters.
    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().clone()
    }

    /// Update the counters in place.
    pub fn record(&self, f: impl FnOnce(&mut PipelineStats)) {
        f(&mut self.stats.lock());
    }

    // ==================== Stop ====================

    /// Ask both workers to exit at their next idle boundary.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Check if stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

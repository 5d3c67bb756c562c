//! Simulated Tracking Engine
//!
//! A stand-in for a probabilistic fiber tracker, for running the pipeline
//! without one. Each seed grows a smooth random walk; some seeds fail on
//! purpose so the miss path gets exercised.
//!
//! # Example
//!
//! ```ignore
//! use tractstream::engine::{SimulatedEngine, SimulatedEngineConfig, TrackingEngine};
//!
//! let mut engine = SimulatedEngine::new(SimulatedEngineConfig {
//!     miss_probability: 0.25,
//!     latency_ms: 15,
//!     ..Default::default()
//! })
//! .with_seed(42);
//!
//! engine.set_seeds(&[seed; 6]);
//! let streamlines = engine.run();
//! ```

use super::TrackingEngine;
use crate::types::Streamline;
use nalgebra::{Point3, Vector3};
use parking_lot::Mutex;
use rand::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shape and timing of simulated streamlines
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedEngineConfig {
    /// Distance between consecutive points
    pub step_length: f64,
    /// Fewest points in a traced streamline
    pub min_points: usize,
    /// Most points in a traced streamline
    pub max_points: usize,
    /// Chance in [0, 1] that a seed yields nothing
    pub miss_probability: f64,
    /// How far the heading may wander per step (0 = straight lines)
    pub curvature: f64,
    /// Artificial time spent in `run`, in milliseconds
    pub latency_ms: u64,
}

impl Default for SimulatedEngineConfig {
    fn default() -> Self {
        Self {
            step_length: 1.0,
            min_points: 10,
            max_points: 40,
            miss_probability: 0.1,
            curvature: 0.25,
            latency_ms: 0,
        }
    }
}

/// Random-walk tracker
pub struct SimulatedEngine {
    config: SimulatedEngineConfig,
    seeds: Vec<Point3<f64>>,
    rng: StdRng,
    runs: Arc<AtomicU64>,
    seed_log: Arc<Mutex<Vec<Vec<Point3<f64>>>>>,
}

impl SimulatedEngine {
    /// Create an engine seeded from entropy
    pub fn new(config: SimulatedEngineConfig) -> Self {
        Self {
            config,
            seeds: Vec::new(),
            rng: StdRng::from_entropy(),
            runs: Arc::new(AtomicU64::new(0)),
            seed_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the engine reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Shared count of `run` calls, readable after the engine moved to a worker
    pub fn run_counter(&self) -> Arc<AtomicU64> {
        self.runs.clone()
    }

    /// Shared record of the seeds used by each `run` call
    pub fn seed_log(&self) -> Arc<Mutex<Vec<Vec<Point3<f64>>>>> {
        self.seed_log.clone()
    }

    fn random_unit(&mut self) -> Vector3<f64> {
        loop {
            let v = Vector3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            if let Some(unit) = v.try_normalize(1e-6) {
                return unit;
            }
        }
    }

    fn trace(&mut self, seed: Point3<f64>) -> Streamline {
        if self.rng.gen::<f64>() < self.config.miss_probability {
            return Streamline::miss();
        }

        let lo = self.config.min_points.max(2);
        let hi = self.config.max_points.max(lo);
        let count = self.rng.gen_range(lo..=hi);

        let mut heading = self.random_unit();
        let mut point = seed;
        let mut points = Vec::with_capacity(count);
        points.push(point);
        for _ in 1..count {
            let wobble = self.random_unit() * self.config.curvature;
            heading = (heading + wobble).try_normalize(1e-9).unwrap_or(heading);
            point += heading * self.config.step_length;
            points.push(point);
        }
        Streamline::new(points)
    }
}

impl TrackingEngine for SimulatedEngine {
    fn set_seeds(&mut self, seeds: &[Point3<f64>]) {
        self.seeds = seeds.to_vec();
    }

    fn run(&mut self) -> Vec<Streamline> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.seed_log.lock().push(self.seeds.clone());

        if self.config.latency_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.latency_ms));
        }

        let seeds = self.seeds.clone();
        let traced: Vec<Streamline> = seeds.into_iter().map(|s| self.trace(s)).collect();
        tracing::trace!(
            "Simulated engine traced {}/{} seeds",
            traced.iter().filter(|s| !s.is_empty()).count(),
            traced.len()
        );
        traced
    }
}

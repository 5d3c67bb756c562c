//! Mock construction helpers

use nalgebra::Point3;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tractstream::engine::TrackingEngine;
use tractstream::scene::ChannelSink;
use tractstream::scene::SceneFrame;
use tractstream::types::Streamline;

use crossbeam_channel::Receiver;

type Script = Box<dyn FnMut(&[Point3<f64>]) -> Vec<Streamline> + Send>;

/// Deterministic engine driven by a closure, recording every call
pub struct ScriptedEngine {
    seeds: Vec<Point3<f64>>,
    script: Script,
    latency: Duration,
    calls: Arc<AtomicUsize>,
    seed_log: Arc<Mutex<Vec<Vec<Point3<f64>>>>>,
}

/// Handles for inspecting a `ScriptedEngine` after it moved into a session
#[derive(Clone)]
pub struct EngineProbe {
    calls: Arc<AtomicUsize>,
    seed_log: Arc<Mutex<Vec<Vec<Point3<f64>>>>>,
}

impl EngineProbe {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seeds(&self, call: usize) -> Vec<Point3<f64>> {
        self.seed_log.lock()[call].clone()
    }
}

impl ScriptedEngine {
    pub fn new(script: impl FnMut(&[Point3<f64>]) -> Vec<Streamline> + Send + 'static) -> Self {
        Self {
            seeds: Vec::new(),
            script: Box::new(script),
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            seed_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always return the same streamlines
    pub fn fixed(streamlines: Vec<Streamline>) -> Self {
        Self::new(move |_| streamlines.clone())
    }

    /// Always return nothing
    pub fn empty() -> Self {
        Self::new(|_| Vec::new())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn probe(&self) -> EngineProbe {
        EngineProbe {
            calls: self.calls.clone(),
            seed_log: self.seed_log.clone(),
        }
    }
}

impl TrackingEngine for ScriptedEngine {
    fn set_seeds(&mut self, seeds: &[Point3<f64>]) {
        self.seeds = seeds.to_vec();
    }

    fn run(&mut self) -> Vec<Streamline> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seed_log.lock().push(self.seeds.clone());
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        (self.script)(&self.seeds)
    }
}

/// Channel sink deep enough that tests never lose a frame
pub fn create_test_sink() -> (ChannelSink, Receiver<SceneFrame>) {
    ChannelSink::new(256)
}

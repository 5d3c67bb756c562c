//! Tracking engine interface
//!
//! The probabilistic fiber tracker is an external, stateful service. The
//! pipeline only needs to hand it a batch of seeds and collect whatever it
//! traced. Each seed in the batch is an independent stochastic sample, so
//! sending the same seed `chunk_size` times yields several candidate
//! streamlines in one call.
//!
//! # Call discipline
//!
//! [`TrackingEngine::run`] is called exactly once per request and its result
//! is kept. Calling it again would draw a second, different sample.
//!
//! # Components
//!
//! - [`TrackingEngine`] - The trait the tract worker drives
//! - [`SimulatedEngine`] - Random-walk tracker for demos and tests (feature-gated)

#[cfg(feature = "simulated-engine")]
pub mod simulated;

#[cfg(feature = "simulated-engine")]
pub use simulated::{SimulatedEngine, SimulatedEngineConfig};

use crate::types::Streamline;
use nalgebra::Point3;

/// A probabilistic tracker queried by the tract-computation worker
///
/// Implementations must be `Send` so the engine can move into the worker
/// thread. `run` may block for a bounded but variable time.
#[cfg_attr(test, mockall::automock)]
pub trait TrackingEngine: Send {
    /// Replace the seeds used by the next `run`
    fn set_seeds(&mut self, seeds: &[Point3<f64>]);

    /// Trace from the current seeds
    ///
    /// Returns the traced streamlines in seed order. A seed the engine could
    /// not track is either left out or returned as an empty streamline; an
    /// empty result is a normal outcome, not an error.
    fn run(&mut self) -> Vec<Streamline>;
}

impl<E: TrackingEngine + ?Sized> TrackingEngine for Box<E> {
    fn set_seeds(&mut self, seeds: &[Point3<f64>]) {
        (**self).set_seeds(seeds)
    }

    fn run(&mut self) -> Vec<Streamline> {
        (**self).run()
    }
}

/// Send `seeds` to `engine` and collect one sample per seed
pub fn track(engine: &mut dyn TrackingEngine, seeds: &[Point3<f64>]) -> Vec<Streamline> {
    engine.set_seeds(seeds);
    engine.run()
}

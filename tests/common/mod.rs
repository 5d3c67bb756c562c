//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::{Duration, Instant};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Poll `condition` until it holds or the test timeout expires
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + test_timeout();
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Drain frames until one satisfies `accept`, or the test timeout expires
pub fn wait_for_frame(
    frames: &crossbeam_channel::Receiver<tractstream::scene::SceneFrame>,
    mut accept: impl FnMut(&tractstream::scene::SceneSnapshot) -> bool,
) -> Option<tractstream::scene::SceneFrame> {
    let deadline = Instant::now() + test_timeout();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match frames.recv_timeout(remaining) {
            Ok(frame) if accept(&frame.snapshot) => return Some(frame),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

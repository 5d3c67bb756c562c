//! Integration tests for session lifecycle
//!
//! These tests run both workers on real threads and validate:
//! - Start, stop and drop
//! - Pose delivery from another thread
//! - Session reset
//! - Stop while the engine is busy

mod common;

use common::builders::{straight_line, SessionConfigBuilder};
use common::mock_helpers::{create_test_sink, ScriptedEngine};
use common::{wait_for, wait_for_frame};
use nalgebra::Matrix4;
use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};
use tractstream::pipeline::{SessionBuilder, TRACT_THREAD_NAME};
use tractstream::types::Pose;
use tractstream::TractError;

#[test]
#[serial]
fn test_session_start_and_stop() {
    let (sink, _frames) = create_test_sink();
    let session = SessionBuilder::new(ScriptedEngine::empty(), Matrix4::identity(), sink)
        .config(SessionConfigBuilder::new().build())
        .start()
        .unwrap();

    assert!(session.is_running());
    let stats = session.stop().expect("workers should exit cleanly");
    assert_eq!(stats.engine_requests, 0);
    assert_eq!(stats.snapshots_published, 0);
}

#[test]
#[serial]
fn test_drop_stops_workers() {
    let engine = ScriptedEngine::fixed(vec![straight_line([0.0; 3], 3)]);
    let probe = engine.probe();
    let (sink, frames) = create_test_sink();
    {
        let session = SessionBuilder::new(engine, Matrix4::identity(), sink)
            .config(SessionConfigBuilder::new().build())
            .start()
            .unwrap();
        session.write_pose(Pose::at(0.0, 0.0, 0.0)).unwrap();
        assert!(wait_for(|| probe.calls() == 1));
    }

    // Workers are joined on drop, so the sink is gone with them
    let start = Instant::now();
    while frames.recv_timeout(Duration::from_millis(10)).is_ok() {
        assert!(start.elapsed() < Duration::from_secs(1));
    }
    assert!(frames.recv().is_err());
}

#[test]
#[serial]
fn test_poses_from_acquisition_thread() {
    let engine = ScriptedEngine::fixed(vec![straight_line([0.0; 3], 4)]);
    let probe = engine.probe();
    let (sink, frames) = create_test_sink();
    let session = SessionBuilder::new(engine, Matrix4::identity(), sink)
        .config(SessionConfigBuilder::new().threshold(3.0).build())
        .start()
        .unwrap();

    let sender = session.pose_sender();
    let acquired = probe.clone();
    let acquisition = thread::spawn(move || {
        for i in 0..5 {
            sender.send(Pose::at(10.0 * i as f64, 0.0, 0.0)).unwrap();
            assert!(wait_for(|| acquired.calls() == i + 1));
        }
    });
    acquisition.join().unwrap();

    let frame = wait_for_frame(&frames, |s| s.populated() == 5).expect("five tubes");
    assert_eq!(frame.snapshot.populated_indices(), vec![0, 6, 12, 18, 24]);

    let stats = session.stop().unwrap();
    assert_eq!(stats.poses_received, 5);
    assert_eq!(stats.poses_accepted, 5);
}

#[test]
#[serial]
fn test_reset_clears_composite() {
    let engine = ScriptedEngine::fixed(vec![straight_line([0.0; 3], 3)]);
    let probe = engine.probe();
    let (sink, frames) = create_test_sink();
    let session = SessionBuilder::new(engine, Matrix4::identity(), sink)
        .config(SessionConfigBuilder::new().build())
        .start()
        .unwrap();

    session.write_pose(Pose::at(0.0, 0.0, 0.0)).unwrap();
    wait_for_frame(&frames, |s| s.populated() == 1).expect("first tube");

    assert_eq!(session.reset().unwrap(), 1);
    let cleared = wait_for_frame(&frames, |s| s.generation() == 1).expect("cleared scene");
    assert!(cleared.snapshot.is_empty());

    // Same position is a fresh start after reset
    session.write_pose(Pose::at(0.0, 0.0, 0.0)).unwrap();
    let frame = wait_for_frame(&frames, |s| s.populated() == 1).expect("tube after reset");
    assert_eq!(frame.snapshot.generation(), 1);
    assert_eq!(frame.snapshot.populated_indices(), vec![0]);
    assert_eq!(probe.calls(), 2);

    session.stop().unwrap();
}

#[test]
#[serial]
fn test_stop_waits_for_engine_call() {
    let engine = ScriptedEngine::fixed(vec![straight_line([0.0; 3], 3)])
        .with_latency(Duration::from_millis(150));
    let probe = engine.probe();
    let (sink, _frames) = create_test_sink();
    let session = SessionBuilder::new(engine, Matrix4::identity(), sink)
        .config(SessionConfigBuilder::new().build())
        .start()
        .unwrap();

    session.write_pose(Pose::at(0.0, 0.0, 0.0)).unwrap();
    assert!(wait_for(|| probe.calls() == 1));

    // In the middle of the engine call
    let stats = session.stop().unwrap();
    assert_eq!(stats.engine_requests, 1);
    assert_eq!(probe.calls(), 1);
}

#[test]
#[serial]
fn test_sender_fails_after_stop() {
    let (sink, _frames) = create_test_sink();
    let session = SessionBuilder::new(ScriptedEngine::empty(), Matrix4::identity(), sink)
        .config(SessionConfigBuilder::new().build())
        .start()
        .unwrap();
    let sender = session.pose_sender();
    session.stop().unwrap();

    assert!(matches!(
        sender.send(Pose::at(1.0, 2.0, 3.0)),
        Err(TractError::SessionStopped)
    ));
}

#[test]
#[serial]
fn test_worker_thread_is_named() {
    let (sink, _frames) = create_test_sink();
    let engine = ScriptedEngine::new(|seeds| {
        let name = thread::current().name().map(str::to_string);
        assert_eq!(name.as_deref(), Some(TRACT_THREAD_NAME));
        vec![straight_line([0.0; 3], 2); seeds.len()]
    });
    let probe = engine.probe();
    let session = SessionBuilder::new(engine, Matrix4::identity(), sink)
        .config(SessionConfigBuilder::new().build())
        .start()
        .unwrap();

    session.write_pose(Pose::at(0.0, 0.0, 0.0)).unwrap();
    assert!(wait_for(|| probe.calls() == 1));
    session.stop().expect("engine ran on the tract thread");
}

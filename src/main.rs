//! tractstream - Demo Entry Point
//!
//! Drives a session with a simulated tracking engine and a synthetic probe
//! sweep, logging each composite snapshot as it arrives.
//!
//! Usage: `tractstream [session.toml]`

use anyhow::Context;
use nalgebra::{Matrix4, Point3, Vector3};
use std::path::PathBuf;
use std::time::Duration;
use tractstream::{
    config::{default_config_path, SessionConfig},
    engine::{SimulatedEngine, SimulatedEngineConfig},
    pipeline::SessionBuilder,
    scene::{latest_frame, ChannelSink},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Probe sample period of the synthetic sweep
const POSE_PERIOD: Duration = Duration::from_millis(20);

/// Number of synthetic poses
const SWEEP_POSES: usize = 400;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tractstream=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();

    tracing::info!("Starting tractstream demo");

    let config_path: Option<PathBuf> = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(default_config_path);
    let config = match &config_path {
        Some(path) if path.exists() => {
            tracing::info!("Loading session config from {:?}", path);
            SessionConfig::load(path).with_context(|| format!("loading {:?}", path))?
        }
        _ => SessionConfig::default(),
    };

    // 2 mm voxels, origin shifted to the volume corner
    let affine = Matrix4::new(
        2.0, 0.0, 0.0, -90.0, //
        0.0, 2.0, 0.0, -126.0, //
        0.0, 0.0, 2.0, -72.0, //
        0.0, 0.0, 0.0, 1.0,
    );
    // Tracker space is mirrored along x relative to the viewer
    let flip_x = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));

    let engine = SimulatedEngine::new(SimulatedEngineConfig {
        latency_ms: 30,
        ..Default::default()
    });
    let (sink, frames) = ChannelSink::new(8);
    let dropped_frames = sink.dropped_counter();

    let session = SessionBuilder::new(engine, affine, sink)
        .config(config)
        .world_transform(flip_x)
        .start()
        .context("starting session")?;

    let poses = session.pose_sender();
    for i in 0..SWEEP_POSES {
        let t = i as f64 * 0.05;
        let tip = Point3::new(-20.0 + 2.0 * t, 10.0 * t.sin(), 5.0 * (0.5 * t).cos());
        let probe = Matrix4::new_translation(&tip.coords);
        poses.submit(tip, Some(probe))?;

        if let Some(frame) = latest_frame(&frames) {
            tracing::info!(
                "Snapshot r{} (generation {}): {} tubes, {} vertices",
                frame.snapshot.revision(),
                frame.snapshot.generation(),
                frame.snapshot.populated(),
                frame.snapshot.vertex_count()
            );
        }

        // New target halfway through
        if i == SWEEP_POSES / 2 {
            session.reset()?;
        }

        std::thread::sleep(POSE_PERIOD);
    }

    tracing::info!("Shutting down...");
    let stats = session.stop()?;
    tracing::info!(
        "Hit rate {:.1}%, {} frames dropped by renderer",
        stats.hit_rate(),
        dropped_frames.load(std::sync::atomic::Ordering::Relaxed)
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

//! Test data builders for creating test objects

use nalgebra::{Matrix4, Point3, Vector3};
use tractstream::config::{SessionConfig, TriggerMode};
use tractstream::types::{Pose, Streamline};

/// Builder for session configs with short poll intervals
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        let mut config = SessionConfig::default();
        config.tracking.poll_interval_ms = 1;
        config.visualization.poll_interval_ms = 1;
        Self { config }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.tracking.chunk_size = chunk_size;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.tracking.distance_threshold = threshold;
        self
    }

    pub fn seed_offset(mut self, offset: f64) -> Self {
        self.config.tracking.seed_offset = offset;
        self
    }

    pub fn trigger(mut self, trigger: TriggerMode) -> Self {
        self.config.tracking.trigger = trigger;
        self
    }

    pub fn viz_poll_ms(mut self, poll_ms: u64) -> Self {
        self.config.visualization.poll_interval_ms = poll_ms;
        self
    }

    pub fn tube(mut self, radius: f64, sides: usize) -> Self {
        self.config.visualization.tube_radius = radius;
        self.config.visualization.tube_sides = sides;
        self
    }

    pub fn handoff_capacity(mut self, capacity: usize) -> Self {
        self.config.handoff.capacity = capacity;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Pure translation affine
pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Probe pose at `tip` pointing along `axis`
pub fn probe_pose(tip: [f64; 3], axis: [f64; 3]) -> Pose {
    let axis = Vector3::from(axis).normalize();
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = helper.cross(&axis).normalize();
    let v = axis.cross(&u);

    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 1>(0, 0).copy_from(&u);
    m.fixed_view_mut::<3, 1>(0, 1).copy_from(&v);
    m.fixed_view_mut::<3, 1>(0, 2).copy_from(&axis);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&Vector3::from(tip));
    Pose::with_matrix(Point3::from(tip), m)
}

/// Streamline along +x starting at `origin` with `points` unit steps
pub fn straight_line(origin: [f64; 3], points: usize) -> Streamline {
    (0..points)
        .map(|i| Point3::new(origin[0] + i as f64, origin[1], origin[2]))
        .collect()
}

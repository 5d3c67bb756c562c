//! Tube mesh construction for single streamlines
//!
//! A streamline becomes a polyline with one color per point, and a regular
//! polygon cross-section is swept along it. Ring orientation follows the
//! polyline by parallel transport so the tube does not twist where the
//! streamline bends. The ends are left open.
//!
//! Construction touches no shared state, so distinct streamlines can be
//! meshed on any thread.

use super::direction::simple_direction;
use crate::config::{DEFAULT_TUBE_RADIUS, DEFAULT_TUBE_SIDES};
use crate::error::{Result, TractError};
use crate::types::{Rgb, Streamline};
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;

/// Cross-section of a swept tube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeParams {
    /// Distance from the centerline to each ring vertex
    pub radius: f64,
    /// Vertices per ring
    pub sides: usize,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_TUBE_RADIUS,
            sides: DEFAULT_TUBE_SIDES,
        }
    }
}

/// Renderable tube around one streamline
#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    centerline: Vec<Point3<f64>>,
    point_colors: Vec<Rgb>,
    /// Ring vertices, `sides` per centerline point, ring by ring
    pub vertices: Vec<Point3<f64>>,
    /// Outward unit normal per vertex
    pub normals: Vec<Vector3<f64>>,
    /// Color per vertex, copied from its centerline point
    pub vertex_colors: Vec<Rgb>,
    /// Triangles as vertex index triples
    pub indices: Vec<[u32; 3]>,
    params: TubeParams,
}

impl TubeMesh {
    /// Number of polyline points the tube was swept along
    pub fn point_count(&self) -> usize {
        self.centerline.len()
    }

    /// Polyline the tube follows
    pub fn centerline(&self) -> &[Point3<f64>] {
        &self.centerline
    }

    /// Per-point colors attached to the polyline
    pub fn point_colors(&self) -> &[Rgb] {
        &self.point_colors
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Cross-section used for the sweep
    pub fn params(&self) -> TubeParams {
        self.params
    }

    /// Axis-aligned bounds of the swept surface
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.inf(v), hi.sup(v))
        }))
    }
}

/// Sweep a tube along `points`, colored per point by `colors`
///
/// Returns `Ok(None)` when there are fewer than 2 points, since no tangent
/// exists. Points and colors must have the same length.
pub fn build_tube(
    points: &[Point3<f64>],
    colors: &[Rgb],
    params: &TubeParams,
) -> Result<Option<TubeMesh>> {
    if points.len() != colors.len() {
        return Err(TractError::Geometry(format!(
            "{} points but {} colors",
            points.len(),
            colors.len()
        )));
    }
    if points.len() < 2 {
        return Ok(None);
    }
    if params.sides < 3 || !(params.radius > 0.0) {
        return Err(TractError::Geometry(format!(
            "invalid tube cross-section: radius {}, {} sides",
            params.radius, params.sides
        )));
    }

    let tangents = tangents(points);
    let frames = transport_frames(&tangents);
    let sides = params.sides;

    let mut vertices = Vec::with_capacity(points.len() * sides);
    let mut normals = Vec::with_capacity(points.len() * sides);
    let mut vertex_colors = Vec::with_capacity(points.len() * sides);

    for ((point, color), (normal, binormal)) in points.iter().zip(colors).zip(&frames) {
        for k in 0..sides {
            let theta = TAU * k as f64 / sides as f64;
            let outward = *normal * theta.cos() + *binormal * theta.sin();
            vertices.push(*point + outward * params.radius);
            normals.push(outward);
            vertex_colors.push(*color);
        }
    }

    let mut indices = Vec::with_capacity((points.len() - 1) * sides * 2);
    for ring in 0..points.len() - 1 {
        let base = ring * sides;
        let next = base + sides;
        for k in 0..sides {
            let k1 = (k + 1) % sides;
            let a = (base + k) as u32;
            let b = (base + k1) as u32;
            let c = (next + k) as u32;
            let d = (next + k1) as u32;
            indices.push([a, c, b]);
            indices.push([b, c, d]);
        }
    }

    Ok(Some(TubeMesh {
        centerline: points.to_vec(),
        point_colors: colors.to_vec(),
        vertices,
        normals,
        vertex_colors,
        indices,
        params: *params,
    }))
}

/// Direction-color and mesh one streamline
///
/// Streamlines too short to have a direction yield `None`.
pub fn tube_for_streamline(streamline: &Streamline, params: &TubeParams) -> Option<TubeMesh> {
    if !streamline.is_traceable() {
        return None;
    }
    let colors = simple_direction(streamline.points());
    match build_tube(streamline.points(), &colors, params) {
        Ok(mesh) => mesh,
        Err(e) => {
            tracing::warn!("Skipping streamline of {} points: {}", streamline.len(), e);
            None
        }
    }
}

/// Unit tangent per point, averaging the adjacent segments
fn tangents(points: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    let segments: Vec<Option<Vector3<f64>>> = points
        .windows(2)
        .map(|w| (w[1] - w[0]).try_normalize(f64::EPSILON))
        .collect();

    let mut result = Vec::with_capacity(points.len());
    let mut last = Vector3::x();
    for i in 0..points.len() {
        let before = if i > 0 { segments[i - 1] } else { None };
        let after = segments.get(i).copied().flatten();
        let tangent = match (before, after) {
            (Some(b), Some(a)) => (a + b).try_normalize(f64::EPSILON).unwrap_or(a),
            (Some(v), None) | (None, Some(v)) => v,
            // Coincident neighbors: keep heading the same way
            (None, None) => last,
        };
        result.push(tangent);
        last = tangent;
    }

    // Leading coincident points take the first real direction
    if let Some(first_real) = segments.iter().flatten().next() {
        for (t, seg) in result.iter_mut().zip(&segments) {
            if seg.is_some() {
                break;
            }
            *t = *first_real;
        }
    }

    result
}

/// Any unit vector perpendicular to `v`
fn perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vector3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&axis).normalize()
}

/// Normal/binormal pair per point, parallel-transported along the tangents
fn transport_frames(tangents: &[Vector3<f64>]) -> Vec<(Vector3<f64>, Vector3<f64>)> {
    let mut frames = Vec::with_capacity(tangents.len());
    let mut normal = perpendicular(&tangents[0]);

    for tangent in tangents {
        let projected = normal - *tangent * normal.dot(tangent);
        normal = projected
            .try_normalize(1e-9)
            .unwrap_or_else(|| perpendicular(tangent));
        let binormal = tangent.cross(&normal);
        frames.push((normal, binormal));
    }

    frames
}

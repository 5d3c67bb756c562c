//! Rendering sinks that receive composite snapshots
//!
//! The visualization worker hands each new snapshot, together with the
//! session's world transform, to a [`RenderSink`]. The sink owns its own
//! redraw scheduling; `present` must return without waiting for a frame.

use super::composite::SceneSnapshot;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use nalgebra::Matrix4;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Destination for composite snapshots
pub trait RenderSink: Send {
    /// Accept a new snapshot to display under `world_transform`
    fn present(&mut self, snapshot: SceneSnapshot, world_transform: &Matrix4<f64>);
}

impl<F> RenderSink for F
where
    F: FnMut(SceneSnapshot, &Matrix4<f64>) + Send,
{
    fn present(&mut self, snapshot: SceneSnapshot, world_transform: &Matrix4<f64>) {
        self(snapshot, world_transform)
    }
}

/// A snapshot plus the transform it should be drawn with
#[derive(Debug, Clone)]
pub struct SceneFrame {
    pub snapshot: SceneSnapshot,
    pub world_transform: Matrix4<f64>,
}

/// Sink that forwards frames over a bounded channel
///
/// Uses `try_send` so a slow renderer never stalls the visualization worker.
/// Frames that do not fit are dropped and counted; since each snapshot holds
/// the whole scene, the next one that fits supersedes them.
pub struct ChannelSink {
    sender: Sender<SceneFrame>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    /// Create a sink and the receiver the renderer drains
    pub fn new(capacity: usize) -> (Self, Receiver<SceneFrame>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    /// Shared counter of frames dropped because the channel was full
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }
}

impl RenderSink for ChannelSink {
    fn present(&mut self, snapshot: SceneSnapshot, world_transform: &Matrix4<f64>) {
        let frame = SceneFrame {
            snapshot,
            world_transform: *world_transform,
        };
        match self.sender.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Render channel full, dropping frame");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!("Render channel closed, frame discarded");
            }
        }
    }
}

/// Take every pending frame and keep only the newest
pub fn latest_frame(receiver: &Receiver<SceneFrame>) -> Option<SceneFrame> {
    receiver.try_iter().last()
}

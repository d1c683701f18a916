use thiserror::Error;

mod ids;
pub use ids::*;
mod store;
pub use store::*;
pub mod collision;
pub mod glue;
pub mod snap;

pub use collision::{DodgeConfig, MovingClip, Resolution};
pub use glue::{glue_clips, glue_selection};
pub use snap::{snap, SnapConfig, SnapMode, TimeSignature};

/// Timeline positions and durations, in seconds.
pub type Seconds = f64;

/// Clips shorter than this are never committed.
pub const MIN_CLIP_DURATION: Seconds = 0.1;

/// Gap under which two clips count as adjacent for gluing.
pub const GLUE_TOLERANCE: Seconds = 0.1;

#[derive(Debug, Error)]
pub enum ArrangementError {
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("clip not found: {0}")]
    ClipNotFound(ClipId),
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("track index {0} out of range")]
    TrackIndexOutOfRange(usize),
    #[error("placement collides with an existing clip")]
    InvalidPlacement,
    #[error("placement out of bounds")]
    OutOfBounds,
}

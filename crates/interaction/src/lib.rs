use thiserror::Error;

mod arranger;
pub use arranger::*;
mod drag;
pub use drag::*;
mod resize;
pub use resize::*;
mod selection;
pub use selection::*;
mod viewport;
pub use viewport::*;

#[derive(Debug, Error)]
pub enum GestureError {
    #[error(transparent)]
    Arrangement(#[from] arrangement::ArrangementError),
    #[error("another gesture is already in progress")]
    GestureInProgress,
    #[error("no active {0} gesture")]
    NoActiveGesture(&'static str),
    #[error("no pending extension proposal")]
    NoPendingProposal,
}

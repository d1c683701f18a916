use serde::{Deserialize, Serialize};

use arrangement::{ClipId, ClipStore, Seconds, MIN_CLIP_DURATION};

use crate::{GestureError, PointerPos, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipEdge {
    Left,
    Right,
}

/// How the interior of an extended clip gets filled. The engine only
/// reports the choice; producing the content is the collaborator's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Leave the extension blank/silent.
    Silence,
    /// Ask a generator to produce new content for the region.
    Generated,
    /// Time-stretch the existing content over the new bounds.
    Stretch,
}

/// Work order handed to the content collaborator after an extension
/// commits: fill `[region_start, region_end)` of the clip per `strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillRequest {
    pub clip_id: ClipId,
    pub region_start: Seconds,
    pub region_end: Seconds,
    pub strategy: FillStrategy,
}

/// A resize that would lengthen the clip past its original bound on the
/// active edge. Purely descriptive: the store is untouched until a fill
/// strategy resolves it, and cancelling discards it outright.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtensionProposal {
    pub clip_id: ClipId,
    pub edge: ClipEdge,
    pub extension_start: Seconds,
    pub extension_end: Seconds,
    pub extension_length: Seconds,
    pub proposed_start: Seconds,
    pub proposed_duration: Seconds,
}

/// Candidate bounds for the clip under resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePreview {
    pub start: Seconds,
    pub duration: Seconds,
}

impl ResizePreview {
    pub fn end(&self) -> Seconds {
        self.start + self.duration
    }
}

/// An in-progress edge resize. Like a drag session, it never outlives the
/// gesture and commits nothing until it ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub clip_id: ClipId,
    pub edge: ClipEdge,
    pub original_start: Seconds,
    pub original_duration: Seconds,
    pub origin: PointerPos,
}

impl ResizeSession {
    pub fn begin(
        store: &ClipStore,
        clip_id: ClipId,
        edge: ClipEdge,
        origin: PointerPos,
    ) -> Result<Self, GestureError> {
        let clip = store
            .clip(clip_id)
            .ok_or(arrangement::ArrangementError::ClipNotFound(clip_id))?;
        Ok(Self {
            clip_id,
            edge,
            original_start: clip.start,
            original_duration: clip.duration,
            origin,
        })
    }

    pub fn original_end(&self) -> Seconds {
        self.original_start + self.original_duration
    }

    /// Candidate bounds for the current pointer, clamped to time zero and
    /// the minimum clip duration.
    pub fn preview(&self, viewport: &Viewport, pointer: PointerPos) -> ResizePreview {
        let delta_time = viewport.dx_to_seconds(pointer.x - self.origin.x);
        match self.edge {
            ClipEdge::Left => {
                let new_start = (self.original_start + delta_time)
                    .max(0.0)
                    .min(self.original_end() - MIN_CLIP_DURATION);
                ResizePreview {
                    start: new_start,
                    duration: self.original_end() - new_start,
                }
            }
            ClipEdge::Right => ResizePreview {
                start: self.original_start,
                duration: (self.original_duration + delta_time).max(MIN_CLIP_DURATION),
            },
        }
    }

    /// The extension implied by `preview`, when it pushes the active edge
    /// past the clip's original bound.
    pub fn extension_for(&self, preview: ResizePreview) -> Option<ExtensionProposal> {
        let (extension_start, extension_end) = match self.edge {
            ClipEdge::Left if preview.start < self.original_start => {
                (preview.start, self.original_start)
            }
            ClipEdge::Right if preview.end() > self.original_end() => {
                (self.original_end(), preview.end())
            }
            _ => return None,
        };
        Some(ExtensionProposal {
            clip_id: self.clip_id,
            edge: self.edge,
            extension_start,
            extension_end,
            extension_length: extension_end - extension_start,
            proposed_start: preview.start,
            proposed_duration: preview.duration,
        })
    }
}

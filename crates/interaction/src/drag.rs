use arrangement::{ClipId, ClipPlacement, ClipStore, MovingClip, Seconds};

use crate::{GestureError, PointerPos, Viewport};

/// An in-progress move of one clip or a selected group. Holds every
/// member's pre-gesture position; nothing is committed until the gesture
/// ends, and cancelling just drops the session.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub anchor: ClipId,
    pub clips: Vec<MovingClip>,
    pub origin: PointerPos,
    exceeded_threshold: bool,
}

/// Live placement feedback for the UI while a move is in flight. Starts
/// and track indices are clamped for display; validation happens at commit.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePreview {
    pub delta_time: Seconds,
    pub track_delta: i64,
    pub placements: Vec<ClipPlacement>,
    /// Still within the click threshold; releasing now is a click.
    pub is_click: bool,
}

impl DragSession {
    /// Capture original positions for every clip being moved. The anchor
    /// is the grabbed clip; for a single-clip move it is the only member.
    pub fn begin(
        store: &ClipStore,
        clip_ids: &[ClipId],
        anchor: ClipId,
        origin: PointerPos,
    ) -> Result<Self, GestureError> {
        let mut clips = Vec::with_capacity(clip_ids.len());
        for &clip_id in clip_ids {
            let clip = store
                .clip(clip_id)
                .ok_or(arrangement::ArrangementError::ClipNotFound(clip_id))?;
            let track_index = store
                .clip_track_index(clip_id)
                .ok_or(arrangement::ArrangementError::ClipNotFound(clip_id))?;
            clips.push(MovingClip {
                clip_id,
                duration: clip.duration,
                original_start: clip.start,
                original_track_index: track_index,
            });
        }
        if !clips.iter().any(|c| c.clip_id == anchor) {
            return Err(arrangement::ArrangementError::ClipNotFound(anchor).into());
        }
        Ok(Self { anchor, clips, origin, exceeded_threshold: false })
    }

    pub fn anchor_clip(&self) -> &MovingClip {
        // begin() guarantees the anchor is a member.
        self.clips
            .iter()
            .find(|c| c.clip_id == self.anchor)
            .unwrap_or(&self.clips[0])
    }

    /// Raw (unsnapped) deltas for the current pointer position.
    pub fn deltas(&self, viewport: &Viewport, pointer: PointerPos) -> (Seconds, i64) {
        let delta_time = viewport.dx_to_seconds(pointer.x - self.origin.x);
        let track_delta = viewport.dy_to_track_delta(pointer.y - self.origin.y);
        (delta_time, track_delta)
    }

    /// Non-committing preview for the current pointer position.
    pub fn update(
        &mut self,
        store: &ClipStore,
        viewport: &Viewport,
        pointer: PointerPos,
    ) -> MovePreview {
        if !viewport.is_click(self.origin, pointer) {
            self.exceeded_threshold = true;
        }
        let (delta_time, track_delta) = self.deltas(viewport, pointer);
        let placements = self.placements(store, delta_time, track_delta);
        MovePreview {
            delta_time,
            track_delta,
            placements,
            is_click: !self.exceeded_threshold,
        }
    }

    pub fn exceeded_threshold(&self) -> bool {
        self.exceeded_threshold
    }

    /// Member placements for a candidate delta, clamped to the timeline.
    pub fn placements(
        &self,
        store: &ClipStore,
        delta_time: Seconds,
        track_delta: i64,
    ) -> Vec<ClipPlacement> {
        let last_track = store.track_count().saturating_sub(1) as i64;
        self.clips
            .iter()
            .map(|clip| ClipPlacement {
                clip_id: clip.clip_id,
                track_index: (clip.original_track_index as i64 + track_delta)
                    .clamp(0, last_track) as usize,
                start: (clip.original_start + delta_time).max(0.0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrangement::Clip;

    fn setup() -> (ClipStore, ClipId, ClipId) {
        let mut store = ClipStore::new();
        store.add_track("A");
        store.add_track("B");
        let a = store.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();
        let b = store.insert_clip(0, Clip::new(6.0, 2.0)).unwrap();
        (store, a, b)
    }

    #[test]
    fn deltas_follow_pointer() {
        let (store, a, _) = setup();
        let viewport = Viewport::default();
        let mut session =
            DragSession::begin(&store, &[a], a, PointerPos::new(100.0, 40.0)).unwrap();

        let preview = session.update(&store, &viewport, PointerPos::new(330.0, 125.0));
        assert_eq!(preview.delta_time, 2.3);
        assert_eq!(preview.track_delta, 1);
        assert!(!preview.is_click);
        assert_eq!(preview.placements[0].track_index, 1);
    }

    #[test]
    fn tiny_motion_stays_a_click() {
        let (store, a, _) = setup();
        let viewport = Viewport::default();
        let mut session =
            DragSession::begin(&store, &[a], a, PointerPos::new(100.0, 40.0)).unwrap();

        let preview = session.update(&store, &viewport, PointerPos::new(102.0, 41.0));
        assert!(preview.is_click);
        // Once exceeded, the session stays a drag even if the pointer
        // returns to the origin.
        session.update(&store, &viewport, PointerPos::new(200.0, 40.0));
        let preview = session.update(&store, &viewport, PointerPos::new(100.0, 40.0));
        assert!(!preview.is_click);
    }

    #[test]
    fn group_preview_keeps_relative_offsets() {
        let (store, a, b) = setup();
        let session =
            DragSession::begin(&store, &[a, b], a, PointerPos::new(0.0, 0.0)).unwrap();

        let placements = session.placements(&store, 1.5, 0);
        assert_eq!(placements[0].start, 1.5);
        assert_eq!(placements[1].start, 7.5);
    }

    #[test]
    fn preview_clamps_to_bounds() {
        let (store, a, _) = setup();
        let session = DragSession::begin(&store, &[a], a, PointerPos::default()).unwrap();

        let placements = session.placements(&store, -10.0, -3);
        assert_eq!(placements[0].start, 0.0);
        assert_eq!(placements[0].track_index, 0);
    }

    #[test]
    fn anchor_must_be_a_member() {
        let (store, a, b) = setup();
        assert!(DragSession::begin(&store, &[a], b, PointerPos::default()).is_err());
    }
}

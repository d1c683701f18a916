use std::collections::HashSet;

use tracing::debug;

use arrangement::{
    collision, glue, snap, Clip, ClipId, ClipPlacement, ClipStore, DodgeConfig, Seconds,
    SnapConfig, TrackId,
};

use crate::{
    ClipEdge, DragSession, ExtensionProposal, FillRequest, FillStrategy, GestureError, GrabZone,
    Modifiers, MovePreview, PointerPos, RangeExtent, ResizePreview, ResizeSession, SelectionState,
    Viewport,
};

/// The single active interactive session. Exactly one gesture may run at a
/// time; commit and cancel are the only exits, so partial state cannot
/// leak into the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Move(DragSession),
    Resize(ResizeSession),
    /// A resize ended past the clip's original bounds and awaits a fill
    /// strategy (or cancellation).
    PendingExtension(ExtensionProposal),
    RangeSelect(RangeDrag),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeDrag {
    pub origin: PointerPos,
    pub origin_time: Seconds,
    pub origin_track: usize,
}

/// What a pointer-down on a clip turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grab {
    /// A move session started (single clip or the whole selection).
    Move,
    Resize(ClipEdge),
    /// Select band or plain click: selection updated, no session.
    Selected,
    SelectionToggled,
    SelectionExtended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The pointer never left the click threshold; nothing moved.
    Click,
    Committed(Vec<ClipPlacement>),
    /// No valid placement within the dodge bound; everything reverted.
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    Committed(Clip),
    /// Bounds exceeded the original span; awaiting a fill strategy.
    Pending(ExtensionProposal),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeUpdate {
    pub preview: ResizePreview,
    pub proposal: Option<ExtensionProposal>,
}

/// Facade over the clip store and all interactive gestures. The store is
/// owned here; renderers read snapshots through `store()` and every
/// mutation funnels through a gesture commit or an explicit edit call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arranger {
    store: ClipStore,
    selection: SelectionState,
    gesture: Gesture,
    pub viewport: Viewport,
    pub snap: SnapConfig,
    pub dodge: DodgeConfig,
}

impl Arranger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &ClipStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn pending_extension(&self) -> Option<&ExtensionProposal> {
        match &self.gesture {
            Gesture::PendingExtension(proposal) => Some(proposal),
            _ => None,
        }
    }

    fn ensure_idle(&self) -> Result<(), GestureError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(GestureError::GestureInProgress)
        }
    }

    // ── Non-gesture edits (import, track-add UI, delete actions) ──

    pub fn add_track(&mut self, name: impl Into<String>) -> TrackId {
        self.store.add_track(name)
    }

    pub fn insert_clip(
        &mut self,
        track_index: usize,
        clip: Clip,
    ) -> Result<ClipId, GestureError> {
        self.ensure_idle()?;
        Ok(self.store.insert_clip(track_index, clip)?)
    }

    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<Clip, GestureError> {
        self.ensure_idle()?;
        let clip = self.store.remove_clip(clip_id)?;
        self.selection.retain_known(&self.store);
        Ok(clip)
    }

    // ── Pointer-down dispatch ──

    /// Classify a pointer-down on a clip and start the matching gesture.
    /// Modifier clicks only adjust the selection; edge handles start a
    /// resize; the lower drag band starts a move (group move when the clip
    /// is already part of a multi-selection).
    pub fn grab_clip(
        &mut self,
        clip_id: ClipId,
        pointer: PointerPos,
        modifiers: Modifiers,
    ) -> Result<Grab, GestureError> {
        self.ensure_idle()?;
        let clip = self
            .store
            .clip(clip_id)
            .ok_or(arrangement::ArrangementError::ClipNotFound(clip_id))?;
        let track_index = self
            .store
            .clip_track_index(clip_id)
            .ok_or(arrangement::ArrangementError::ClipNotFound(clip_id))?;

        if modifiers.ctrl {
            self.selection.toggle(clip_id);
            return Ok(Grab::SelectionToggled);
        }
        if modifiers.shift {
            self.selection.add(clip_id);
            return Ok(Grab::SelectionExtended);
        }

        let local_x = pointer.x - self.viewport.seconds_to_px(clip.start);
        let local_y = pointer.y - track_index as f32 * self.viewport.track_height;
        let width = self.viewport.seconds_to_px(clip.duration);
        match GrabZone::classify(&self.viewport, local_x, local_y, width) {
            GrabZone::LeftHandle => {
                self.begin_resize(clip_id, ClipEdge::Left, pointer)?;
                Ok(Grab::Resize(ClipEdge::Left))
            }
            GrabZone::RightHandle => {
                self.begin_resize(clip_id, ClipEdge::Right, pointer)?;
                Ok(Grab::Resize(ClipEdge::Right))
            }
            GrabZone::SelectBand => {
                if !self.selection.contains(clip_id) {
                    self.selection.select_single(clip_id);
                }
                Ok(Grab::Selected)
            }
            GrabZone::DragBand => {
                let clip_ids = if self.selection.contains(clip_id) && self.selection.count() > 1 {
                    // Anchor first, then the rest of the group.
                    let mut ids = vec![clip_id];
                    ids.extend(
                        self.selection
                            .selected()
                            .iter()
                            .copied()
                            .filter(|id| *id != clip_id),
                    );
                    ids
                } else {
                    self.selection.select_single(clip_id);
                    vec![clip_id]
                };
                self.begin_move(&clip_ids, pointer)?;
                Ok(Grab::Move)
            }
        }
    }

    // ── Move session ──

    /// Start a move of `clip_ids`; the first id is the anchor whose start
    /// time gets snapped at commit.
    pub fn begin_move(
        &mut self,
        clip_ids: &[ClipId],
        origin: PointerPos,
    ) -> Result<(), GestureError> {
        self.ensure_idle()?;
        let anchor = *clip_ids
            .first()
            .ok_or_else(|| arrangement::ArrangementError::InvalidOp("empty move set".into()))?;
        let session = DragSession::begin(&self.store, clip_ids, anchor, origin)?;
        debug!(clips = clip_ids.len(), %anchor, "move session started");
        self.gesture = Gesture::Move(session);
        Ok(())
    }

    /// Non-committing preview for the current pointer position.
    pub fn update_move(&mut self, pointer: PointerPos) -> Result<MovePreview, GestureError> {
        let Gesture::Move(session) = &mut self.gesture else {
            return Err(GestureError::NoActiveGesture("move"));
        };
        Ok(session.update(&self.store, &self.viewport, pointer))
    }

    /// End the move: snap, resolve collisions, and commit every member
    /// atomically — or revert everything.
    pub fn commit_move(&mut self, pointer: PointerPos) -> Result<MoveOutcome, GestureError> {
        let Gesture::Move(session) = std::mem::take(&mut self.gesture) else {
            return Err(GestureError::NoActiveGesture("move"));
        };

        let (raw_delta, track_delta) = session.deltas(&self.viewport, pointer);
        if !session.exceeded_threshold() && self.viewport.is_click(session.origin, pointer) {
            return Ok(MoveOutcome::Click);
        }

        // Snap the anchor; members keep their exact relative offsets.
        let anchor = session.anchor_clip();
        let snapped_start = snap::snap(anchor.original_start + raw_delta, &self.snap);
        let delta_time = snapped_start - anchor.original_start;

        let resolution =
            collision::resolve(&self.store, &session.clips, delta_time, track_delta, &self.dodge);
        if !resolution.valid {
            debug!(delta_time, track_delta, "move rejected: no valid placement");
            return Ok(MoveOutcome::Rejected);
        }

        let placements =
            session.placements(&self.store, resolution.delta_time, resolution.track_delta);
        match self.store.apply_move(&placements) {
            Ok(()) => {
                debug!(
                    clips = placements.len(),
                    delta_time = resolution.delta_time,
                    track_delta = resolution.track_delta,
                    "move committed"
                );
                Ok(MoveOutcome::Committed(placements))
            }
            Err(err) => {
                debug!(%err, "move rejected at commit");
                Ok(MoveOutcome::Rejected)
            }
        }
    }

    pub fn cancel_move(&mut self) -> Result<(), GestureError> {
        match self.gesture {
            Gesture::Move(_) => {
                self.gesture = Gesture::Idle;
                Ok(())
            }
            _ => Err(GestureError::NoActiveGesture("move")),
        }
    }

    // ── Resize session ──

    pub fn begin_resize(
        &mut self,
        clip_id: ClipId,
        edge: ClipEdge,
        origin: PointerPos,
    ) -> Result<(), GestureError> {
        self.ensure_idle()?;
        let session = ResizeSession::begin(&self.store, clip_id, edge, origin)?;
        debug!(%clip_id, ?edge, "resize session started");
        self.gesture = Gesture::Resize(session);
        Ok(())
    }

    /// Preview the resize; when the candidate bounds exceed the clip's
    /// original span the update carries the extension proposal the commit
    /// would raise.
    pub fn update_resize(&mut self, pointer: PointerPos) -> Result<ResizeUpdate, GestureError> {
        let Gesture::Resize(session) = &self.gesture else {
            return Err(GestureError::NoActiveGesture("resize"));
        };
        let preview = session.preview(&self.viewport, pointer);
        Ok(ResizeUpdate { preview, proposal: session.extension_for(preview) })
    }

    /// End the resize. Within the original span it commits directly;
    /// past it, the gesture parks as a pending extension and nothing is
    /// written until a fill strategy resolves it.
    pub fn finish_resize(&mut self, pointer: PointerPos) -> Result<ResizeOutcome, GestureError> {
        let Gesture::Resize(session) = std::mem::take(&mut self.gesture) else {
            return Err(GestureError::NoActiveGesture("resize"));
        };
        let preview = session.preview(&self.viewport, pointer);
        if let Some(proposal) = session.extension_for(preview) {
            debug!(
                clip = %proposal.clip_id,
                length = proposal.extension_length,
                "extension proposed, awaiting fill strategy"
            );
            self.gesture = Gesture::PendingExtension(proposal);
            return Ok(ResizeOutcome::Pending(proposal));
        }
        let clip = self
            .store
            .apply_resize(session.clip_id, preview.start, preview.duration)?
            .clone();
        debug!(clip = %clip.id, start = clip.start, duration = clip.duration, "resize committed");
        Ok(ResizeOutcome::Committed(clip))
    }

    /// Resolve a pending extension with a fill strategy: the clip commits
    /// to its extended bounds and the caller receives the fill work order
    /// for the new interior.
    pub fn resolve_extension(
        &mut self,
        strategy: FillStrategy,
    ) -> Result<(Clip, FillRequest), GestureError> {
        let Gesture::PendingExtension(proposal) = std::mem::take(&mut self.gesture) else {
            return Err(GestureError::NoPendingProposal);
        };
        let clip = self
            .store
            .apply_resize(proposal.clip_id, proposal.proposed_start, proposal.proposed_duration)?
            .clone();
        debug!(clip = %clip.id, ?strategy, "extension committed");
        Ok((
            clip,
            FillRequest {
                clip_id: proposal.clip_id,
                region_start: proposal.extension_start,
                region_end: proposal.extension_end,
                strategy,
            },
        ))
    }

    pub fn cancel_resize(&mut self) -> Result<(), GestureError> {
        match self.gesture {
            Gesture::Resize(_) => {
                self.gesture = Gesture::Idle;
                Ok(())
            }
            _ => Err(GestureError::NoActiveGesture("resize")),
        }
    }

    /// Discard a pending extension with zero mutation.
    pub fn cancel_extension(&mut self) -> Result<(), GestureError> {
        match self.gesture {
            Gesture::PendingExtension(_) => {
                self.gesture = Gesture::Idle;
                Ok(())
            }
            _ => Err(GestureError::NoPendingProposal),
        }
    }

    // ── Selection ──

    /// Start a rectangular range selection from empty space or a clip.
    pub fn begin_range_selection(&mut self, pointer: PointerPos) -> Result<(), GestureError> {
        self.ensure_idle()?;
        self.gesture = Gesture::RangeSelect(RangeDrag {
            origin: pointer,
            origin_time: self.viewport.time_at_x(pointer.x),
            origin_track: self.viewport.track_at_y(pointer.y, self.store.track_count()),
        });
        Ok(())
    }

    pub fn update_range_selection(
        &mut self,
        pointer: PointerPos,
    ) -> Result<&HashSet<ClipId>, GestureError> {
        let Gesture::RangeSelect(drag) = &self.gesture else {
            return Err(GestureError::NoActiveGesture("range selection"));
        };
        let drag = *drag;
        let extent = RangeExtent::normalized(
            drag.origin_time,
            self.viewport.time_at_x(pointer.x),
            drag.origin_track,
            self.viewport.track_at_y(pointer.y, self.store.track_count()),
        );
        self.selection.set_range(&self.store, extent, true);
        Ok(self.selection.selected())
    }

    /// Finish the sweep. Sub-threshold drags degenerate to a click that
    /// clears the selection; otherwise membership freezes and the result
    /// is draggable as a group.
    pub fn finish_range_selection(
        &mut self,
        pointer: PointerPos,
    ) -> Result<&HashSet<ClipId>, GestureError> {
        let Gesture::RangeSelect(drag) = std::mem::take(&mut self.gesture) else {
            return Err(GestureError::NoActiveGesture("range selection"));
        };
        if self.viewport.is_click(drag.origin, pointer) {
            self.selection.clear();
            return Ok(self.selection.selected());
        }
        let extent = RangeExtent::normalized(
            drag.origin_time,
            self.viewport.time_at_x(pointer.x),
            drag.origin_track,
            self.viewport.track_at_y(pointer.y, self.store.track_count()),
        );
        self.selection.set_range(&self.store, extent, false);
        Ok(self.selection.selected())
    }

    /// One-shot range selection, for callers that track the sweep
    /// themselves.
    pub fn set_range_selection(
        &mut self,
        time_range: (Seconds, Seconds),
        track_range: (usize, usize),
    ) -> &HashSet<ClipId> {
        let extent = RangeExtent::normalized(
            time_range.0,
            time_range.1,
            track_range.0,
            track_range.1,
        );
        self.selection.set_range(&self.store, extent, false);
        self.selection.selected()
    }

    pub fn toggle_clip_selection(&mut self, clip_id: ClipId) {
        self.selection.toggle(clip_id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ── Glue ──

    /// Merge adjacent selected clips per track; the selection is cleared
    /// afterwards.
    pub fn glue_selection(&mut self) -> Result<Vec<Clip>, GestureError> {
        self.ensure_idle()?;
        let merged = glue::glue_selection(&mut self.store, self.selection.selected())?;
        debug!(merged = merged.len(), "glued selection");
        self.selection.clear();
        Ok(merged)
    }

    // ── Cancellation ──

    /// Cancel whatever gesture is active, reverting to the pre-gesture
    /// state. Returns true if there was one.
    pub fn cancel_gesture(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        debug!("gesture cancelled");
        self.gesture = Gesture::Idle;
        true
    }

    /// Escape key: cancel the active gesture, or clear the selection when
    /// nothing is in flight.
    pub fn escape(&mut self) {
        if !self.cancel_gesture() {
            self.selection.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrangement::SnapMode;

    fn arranger_with_clips() -> (Arranger, ClipId, ClipId) {
        let mut arranger = Arranger::new();
        arranger.add_track("A");
        arranger.add_track("B");
        let a = arranger.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();
        let b = arranger.insert_clip(0, Clip::new(4.0, 4.0)).unwrap();
        (arranger, a, b)
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let (mut arranger, a, b) = arranger_with_clips();
        arranger.begin_move(&[a], PointerPos::default()).unwrap();
        let err = arranger.begin_resize(b, ClipEdge::Right, PointerPos::default());
        assert!(matches!(err, Err(GestureError::GestureInProgress)));
        assert!(arranger.cancel_gesture());
        arranger
            .begin_resize(b, ClipEdge::Right, PointerPos::default())
            .unwrap();
    }

    #[test]
    fn grab_zones_route_to_sessions() {
        let (mut arranger, a, _) = arranger_with_clips();
        // Clip A spans x [0,400), track 0 spans y [0,80).
        let grab = arranger
            .grab_clip(a, PointerPos::new(5.0, 60.0), Modifiers::default())
            .unwrap();
        assert_eq!(grab, Grab::Resize(ClipEdge::Left));
        arranger.cancel_resize().unwrap();

        let grab = arranger
            .grab_clip(a, PointerPos::new(200.0, 20.0), Modifiers::default())
            .unwrap();
        assert_eq!(grab, Grab::Selected);
        assert!(arranger.selection().contains(a));

        let grab = arranger
            .grab_clip(a, PointerPos::new(200.0, 60.0), Modifiers::default())
            .unwrap();
        assert_eq!(grab, Grab::Move);
        arranger.cancel_move().unwrap();
    }

    #[test]
    fn ctrl_click_toggles_without_dragging() {
        let (mut arranger, a, b) = arranger_with_clips();
        let ctrl = Modifiers { ctrl: true, shift: false };
        arranger.grab_clip(a, PointerPos::new(200.0, 60.0), ctrl).unwrap();
        arranger.grab_clip(b, PointerPos::new(600.0, 60.0), ctrl).unwrap();
        assert_eq!(arranger.selection().count(), 2);
        assert!(arranger.is_idle());
        arranger.grab_clip(a, PointerPos::new(200.0, 60.0), ctrl).unwrap();
        assert!(!arranger.selection().contains(a));
    }

    #[test]
    fn grabbing_a_selected_clip_moves_the_group() {
        let (mut arranger, a, b) = arranger_with_clips();
        arranger.toggle_clip_selection(a);
        arranger.toggle_clip_selection(b);
        let grab = arranger
            .grab_clip(a, PointerPos::new(200.0, 60.0), Modifiers::default())
            .unwrap();
        assert_eq!(grab, Grab::Move);
        let preview = arranger.update_move(PointerPos::new(300.0, 60.0)).unwrap();
        assert_eq!(preview.placements.len(), 2);
    }

    #[test]
    fn snapped_commit_lands_on_grid() {
        let (mut arranger, a, _) = arranger_with_clips();
        arranger.snap = SnapConfig { mode: SnapMode::Grid, ..Default::default() };
        // Move A well clear of B: +10s raw becomes +10.3 via pointer px.
        arranger.begin_move(&[a], PointerPos::new(0.0, 60.0)).unwrap();
        let outcome = arranger.commit_move(PointerPos::new(1030.0, 60.0)).unwrap();
        let MoveOutcome::Committed(placements) = outcome else {
            panic!("expected commit");
        };
        assert_eq!(placements[0].start, 10.5);
        assert_eq!(arranger.store().clip(a).unwrap().start, 10.5);
    }

    #[test]
    fn degenerate_drag_is_a_click() {
        let (mut arranger, a, _) = arranger_with_clips();
        arranger.begin_move(&[a], PointerPos::new(100.0, 60.0)).unwrap();
        arranger.update_move(PointerPos::new(101.0, 60.0)).unwrap();
        let outcome = arranger.commit_move(PointerPos::new(101.0, 61.0)).unwrap();
        assert_eq!(outcome, MoveOutcome::Click);
        assert_eq!(arranger.store().clip(a).unwrap().start, 0.0);
    }

    #[test]
    fn escape_cancels_then_clears() {
        let (mut arranger, a, _) = arranger_with_clips();
        arranger.toggle_clip_selection(a);
        arranger.begin_move(&[a], PointerPos::default()).unwrap();
        arranger.escape();
        assert!(arranger.is_idle());
        assert_eq!(arranger.selection().count(), 1);
        arranger.escape();
        assert!(arranger.selection().is_empty());
    }
}

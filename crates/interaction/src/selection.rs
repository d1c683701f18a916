use std::collections::HashSet;

use arrangement::{ClipId, ClipStore, Seconds};

/// Rectangular extent a range selection was built from. Kept while the
/// range drag is active so membership can be recomputed as it grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeExtent {
    pub start_time: Seconds,
    pub end_time: Seconds,
    pub start_track: usize,
    pub end_track: usize,
}

impl RangeExtent {
    /// Normalized so start <= end on both axes, whatever direction the
    /// user dragged in.
    pub fn normalized(
        time_a: Seconds,
        time_b: Seconds,
        track_a: usize,
        track_b: usize,
    ) -> Self {
        Self {
            start_time: time_a.min(time_b),
            end_time: time_a.max(time_b),
            start_track: track_a.min(track_b),
            end_track: track_a.max(track_b),
        }
    }
}

/// Multi-clip selection: explicit toggles plus rectangular range sweeps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    selected: HashSet<ClipId>,
    primary: Option<ClipId>,
    range: Option<RangeExtent>,
    /// True while a range drag is still recomputing membership.
    active: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &HashSet<ClipId> {
        &self.selected
    }

    pub fn primary(&self) -> Option<ClipId> {
        self.primary
    }

    pub fn range(&self) -> Option<RangeExtent> {
        self.range
    }

    pub fn is_range_active(&self) -> bool {
        self.active
    }

    pub fn contains(&self, clip_id: ClipId) -> bool {
        self.selected.contains(&clip_id)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Replace the selection with a single clip (plain click).
    pub fn select_single(&mut self, clip_id: ClipId) {
        self.selected.clear();
        self.selected.insert(clip_id);
        self.primary = Some(clip_id);
        self.range = None;
        self.active = false;
    }

    /// Add without removing prior members (shift-click).
    pub fn add(&mut self, clip_id: ClipId) {
        self.selected.insert(clip_id);
        if self.primary.is_none() {
            self.primary = Some(clip_id);
        }
    }

    pub fn remove(&mut self, clip_id: ClipId) {
        self.selected.remove(&clip_id);
        if self.primary == Some(clip_id) {
            self.primary = self.selected.iter().next().copied();
        }
    }

    /// Toggle membership (ctrl/cmd-click).
    pub fn toggle(&mut self, clip_id: ClipId) {
        if self.selected.contains(&clip_id) {
            self.remove(clip_id);
        } else {
            self.add(clip_id);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.primary = None;
        self.range = None;
        self.active = false;
    }

    /// Recompute membership from a rectangular extent: every clip whose
    /// interval intersects the time range, on any track inside the track
    /// window, becomes a member.
    pub fn set_range(&mut self, store: &ClipStore, extent: RangeExtent, active: bool) {
        self.selected.clear();
        for track_index in extent.start_track..=extent.end_track.min(store.track_count().saturating_sub(1)) {
            for clip in store.clips_on(track_index) {
                if clip.overlaps(extent.start_time, extent.end_time) {
                    self.selected.insert(clip.id);
                }
            }
        }
        self.primary = self.selected.iter().next().copied();
        self.range = Some(extent);
        self.active = active;
    }

    /// Freeze an active range selection; it is now draggable as a group.
    pub fn finalize_range(&mut self) {
        self.active = false;
    }

    /// Drop clips that no longer exist in the store (post-glue cleanup).
    pub fn retain_known(&mut self, store: &ClipStore) {
        self.selected.retain(|id| store.clip(*id).is_some());
        if let Some(primary) = self.primary {
            if store.clip(primary).is_none() {
                self.primary = self.selected.iter().next().copied();
            }
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::{ArrangementError, ClipId, Seconds, TrackId, MIN_CLIP_DURATION};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub start: Seconds,
    pub duration: Seconds,
    #[serde(default)]
    pub fade_in: Seconds,
    #[serde(default)]
    pub fade_out: Seconds,
    pub asset_id: Option<String>,
    /// Ids of the clips this one was glued from, if any.
    #[serde(default)]
    pub merged_from: Vec<ClipId>,
    #[serde(default)]
    pub metadata: Value,
}

impl Clip {
    pub fn new(start: Seconds, duration: Seconds) -> Self {
        Self {
            id: ClipId::new(),
            start,
            duration,
            fade_in: 0.0,
            fade_out: 0.0,
            asset_id: None,
            merged_from: Vec::new(),
            metadata: Value::Null,
        }
    }

    pub fn with_asset(start: Seconds, duration: Seconds, asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            ..Self::new(start, duration)
        }
    }

    pub fn end(&self) -> Seconds {
        self.start + self.duration
    }

    /// Half-open interval test: touching endpoints do not overlap.
    pub fn overlaps(&self, start: Seconds, end: Seconds) -> bool {
        !(end <= self.start || start >= self.end())
    }

    pub(crate) fn clamp_fades(&mut self) {
        self.fade_in = self.fade_in.clamp(0.0, self.duration);
        self.fade_out = self.fade_out.clamp(0.0, self.duration);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Group parent, visual-only; parents do not hold clips themselves.
    #[serde(default)]
    pub parent: Option<TrackId>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub clip_ids: Vec<ClipId>,
}

/// One clip's target in an atomic group commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlacement {
    pub clip_id: ClipId,
    pub track_index: usize,
    pub start: Seconds,
}

/// Canonical in-memory model of tracks and clips. All committed mutations
/// pass through here; every mutating method either upholds the no-overlap
/// and minimum-duration invariants or returns an error with the store
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClipStore {
    clips: HashMap<ClipId, Clip>,
    tracks: Vec<Track>,
}

impl ClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&mut self, name: impl Into<String>) -> TrackId {
        let track = Track {
            id: TrackId::new(),
            name: name.into(),
            parent: None,
            collapsed: false,
            clip_ids: Vec::new(),
        };
        let id = track.id;
        self.tracks.push(track);
        id
    }

    pub fn add_grouped_track(
        &mut self,
        name: impl Into<String>,
        parent: TrackId,
    ) -> Result<TrackId, ArrangementError> {
        if !self.tracks.iter().any(|t| t.id == parent) {
            return Err(ArrangementError::TrackNotFound(parent));
        }
        let id = self.add_track(name);
        if let Some(track) = self.tracks.last_mut() {
            track.parent = Some(parent);
        }
        Ok(id)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_index_of(&self, track_id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.get(&clip_id)
    }

    pub fn clip_ids(&self) -> impl Iterator<Item = ClipId> + '_ {
        self.clips.keys().copied()
    }

    /// Track index holding the given clip, if any.
    pub fn clip_track_index(&self, clip_id: ClipId) -> Option<usize> {
        self.tracks
            .iter()
            .position(|t| t.clip_ids.contains(&clip_id))
    }

    /// Clips on a track, ordered by start time. Renderer-facing snapshot.
    pub fn clips_on(&self, track_index: usize) -> Vec<&Clip> {
        let Some(track) = self.tracks.get(track_index) else {
            return Vec::new();
        };
        let mut clips: Vec<&Clip> = track
            .clip_ids
            .iter()
            .filter_map(|id| self.clips.get(id))
            .collect();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        clips
    }

    /// True if `[start, end)` intersects any clip on the track, ignoring
    /// ids in `exclude`.
    pub fn has_overlap(
        &self,
        track_index: usize,
        start: Seconds,
        end: Seconds,
        exclude: &HashSet<ClipId>,
    ) -> bool {
        let Some(track) = self.tracks.get(track_index) else {
            return false;
        };
        track
            .clip_ids
            .iter()
            .filter(|id| !exclude.contains(id))
            .filter_map(|id| self.clips.get(id))
            .any(|clip| clip.overlaps(start, end))
    }

    pub fn insert_clip(
        &mut self,
        track_index: usize,
        mut clip: Clip,
    ) -> Result<ClipId, ArrangementError> {
        if track_index >= self.tracks.len() {
            return Err(ArrangementError::TrackIndexOutOfRange(track_index));
        }
        if clip.start < 0.0 || clip.duration < MIN_CLIP_DURATION {
            return Err(ArrangementError::OutOfBounds);
        }
        if self.clips.contains_key(&clip.id) {
            return Err(ArrangementError::InvalidOp(format!(
                "clip already exists: {}",
                clip.id
            )));
        }
        if self.has_overlap(track_index, clip.start, clip.end(), &HashSet::new()) {
            return Err(ArrangementError::InvalidPlacement);
        }
        clip.clamp_fades();
        let id = clip.id;
        self.tracks[track_index].clip_ids.push(id);
        self.clips.insert(id, clip);
        Ok(id)
    }

    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<Clip, ArrangementError> {
        let clip = self
            .clips
            .remove(&clip_id)
            .ok_or(ArrangementError::ClipNotFound(clip_id))?;
        for track in self.tracks.iter_mut() {
            track.clip_ids.retain(|id| *id != clip_id);
        }
        Ok(clip)
    }

    /// Commit a group move. Either every placement is applied or, on any
    /// validation failure, the store is left untouched.
    pub fn apply_move(&mut self, placements: &[ClipPlacement]) -> Result<(), ArrangementError> {
        let moving: HashSet<ClipId> = placements.iter().map(|p| p.clip_id).collect();

        // Validate the whole batch against the post-move world first.
        for placement in placements {
            let clip = self
                .clips
                .get(&placement.clip_id)
                .ok_or(ArrangementError::ClipNotFound(placement.clip_id))?;
            if placement.track_index >= self.tracks.len() || placement.start < 0.0 {
                return Err(ArrangementError::OutOfBounds);
            }
            let end = placement.start + clip.duration;
            if self.has_overlap(placement.track_index, placement.start, end, &moving) {
                return Err(ArrangementError::InvalidPlacement);
            }
            for other in placements {
                if other.clip_id == placement.clip_id || other.track_index != placement.track_index
                {
                    continue;
                }
                let other_dur = self
                    .clips
                    .get(&other.clip_id)
                    .ok_or(ArrangementError::ClipNotFound(other.clip_id))?
                    .duration;
                if !(end <= other.start || placement.start >= other.start + other_dur) {
                    return Err(ArrangementError::InvalidPlacement);
                }
            }
        }

        for placement in placements {
            for track in self.tracks.iter_mut() {
                track.clip_ids.retain(|id| *id != placement.clip_id);
            }
            self.tracks[placement.track_index]
                .clip_ids
                .push(placement.clip_id);
            if let Some(clip) = self.clips.get_mut(&placement.clip_id) {
                clip.start = placement.start;
            }
        }
        Ok(())
    }

    /// Commit new bounds for a single clip, clamping fades to the new
    /// duration. Rejects rather than clamps an invalid target.
    pub fn apply_resize(
        &mut self,
        clip_id: ClipId,
        new_start: Seconds,
        new_duration: Seconds,
    ) -> Result<&Clip, ArrangementError> {
        let track_index = self
            .clip_track_index(clip_id)
            .ok_or(ArrangementError::ClipNotFound(clip_id))?;
        if new_start < 0.0 || new_duration < MIN_CLIP_DURATION {
            return Err(ArrangementError::OutOfBounds);
        }
        let exclude: HashSet<ClipId> = [clip_id].into();
        if self.has_overlap(track_index, new_start, new_start + new_duration, &exclude) {
            return Err(ArrangementError::InvalidPlacement);
        }
        let clip = self
            .clips
            .get_mut(&clip_id)
            .ok_or(ArrangementError::ClipNotFound(clip_id))?;
        clip.start = new_start;
        clip.duration = new_duration;
        clip.clamp_fades();
        Ok(&*clip)
    }

    /// Debug check of the no-overlap invariant across every track.
    pub fn check_no_overlap(&self) -> bool {
        (0..self.tracks.len()).all(|index| {
            let clips = self.clips_on(index);
            clips
                .windows(2)
                .all(|pair| pair[0].end() <= pair[1].start + f64::EPSILON)
        })
    }
}

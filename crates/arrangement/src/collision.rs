use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{ClipId, ClipStore, Seconds};

/// Tuning for the dodge search. Both values came out of interaction
/// testing rather than any derivation, so they stay configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DodgeConfig {
    /// Seconds added per retry, opposite the initial movement direction.
    pub step: Seconds,
    /// Retries after the initial candidate fails.
    pub max_attempts: u32,
}

impl Default for DodgeConfig {
    fn default() -> Self {
        Self { step: 5.0, max_attempts: 10 }
    }
}

/// A clip participating in a proposed move, pinned to its pre-gesture
/// position. Group moves pass one entry per member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingClip {
    pub clip_id: ClipId,
    pub duration: Seconds,
    pub original_start: Seconds,
    pub original_track_index: usize,
}

/// Outcome of `resolve`: the (possibly dodged) deltas, or `valid = false`
/// when no placement was found within the attempt bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub delta_time: Seconds,
    pub track_delta: i64,
    pub valid: bool,
}

/// True when every member clip can be placed at `(delta_time, track_delta)`
/// without leaving the timeline or touching a non-moving clip.
pub fn placement_is_valid(
    store: &ClipStore,
    moving: &[MovingClip],
    delta_time: Seconds,
    track_delta: i64,
) -> bool {
    let moving_ids: HashSet<ClipId> = moving.iter().map(|m| m.clip_id).collect();
    moving.iter().all(|clip| {
        let new_start = clip.original_start + delta_time;
        if new_start < 0.0 {
            return false;
        }
        let new_index = clip.original_track_index as i64 + track_delta;
        if new_index < 0 || new_index as usize >= store.track_count() {
            return false;
        }
        !store.has_overlap(
            new_index as usize,
            new_start,
            new_start + clip.duration,
            &moving_ids,
        )
    })
}

/// Validate a candidate move and, when it collides, search nearby time
/// offsets for a legal one. The search steps `config.step` seconds per
/// attempt, away from the initial movement direction, and gives up after
/// `config.max_attempts` retries. Group moves are all-or-nothing: validity
/// requires every member to fit simultaneously.
pub fn resolve(
    store: &ClipStore,
    moving: &[MovingClip],
    delta_time: Seconds,
    track_delta: i64,
    config: &DodgeConfig,
) -> Resolution {
    if moving.is_empty() {
        return Resolution { delta_time, track_delta, valid: false };
    }
    let step = if delta_time >= 0.0 { -config.step } else { config.step };
    let mut candidate = delta_time;
    for _ in 0..=config.max_attempts {
        if placement_is_valid(store, moving, candidate, track_delta) {
            return Resolution { delta_time: candidate, track_delta, valid: true };
        }
        candidate += step;
    }
    Resolution { delta_time, track_delta, valid: false }
}

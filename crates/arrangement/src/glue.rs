use std::collections::{HashMap, HashSet};

use crate::{ArrangementError, Clip, ClipId, ClipStore, Seconds, GLUE_TOLERANCE};

/// Merge temporally-adjacent selected clips, per track, into single clips.
///
/// Selected clips are grouped by track and scanned in start order; every
/// maximal run whose inter-clip gaps stay within `tolerance` and that has
/// at least two members is replaced by one clip spanning the run. Clips
/// outside any run, and tracks with a single selected member, are left
/// untouched. Returns the replacement clips.
pub fn glue_clips(
    store: &mut ClipStore,
    selected: &HashSet<ClipId>,
    tolerance: Seconds,
) -> Result<Vec<Clip>, ArrangementError> {
    if selected.len() < 2 {
        return Err(ArrangementError::InvalidOp(
            "glue requires at least two selected clips".into(),
        ));
    }

    let mut by_track: HashMap<usize, Vec<ClipId>> = HashMap::new();
    for &clip_id in selected {
        let track_index = store
            .clip_track_index(clip_id)
            .ok_or(ArrangementError::ClipNotFound(clip_id))?;
        by_track.entry(track_index).or_default().push(clip_id);
    }

    // Plan every replacement before touching the store so a failing run
    // leaves everything in place.
    let mut planned: Vec<(usize, Vec<ClipId>, Clip)> = Vec::new();
    for (&track_index, ids) in &by_track {
        if ids.len() < 2 {
            continue;
        }
        let mut members: Vec<&Clip> = ids.iter().filter_map(|id| store.clip(*id)).collect();
        members.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut run: Vec<&Clip> = Vec::new();
        for clip in members {
            let adjacent = run
                .last()
                .map(|prev| (clip.start - prev.end()).abs() <= tolerance)
                .unwrap_or(true);
            if !adjacent {
                if run.len() >= 2 {
                    planned.push(plan_run(track_index, &run));
                }
                run.clear();
            }
            run.push(clip);
        }
        if run.len() >= 2 {
            planned.push(plan_run(track_index, &run));
        }
    }

    for (track_index, run_ids, merged) in &planned {
        let run_set: HashSet<ClipId> = run_ids.iter().copied().collect();
        if store.has_overlap(*track_index, merged.start, merged.end(), &run_set) {
            return Err(ArrangementError::InvalidPlacement);
        }
    }

    let mut merged_clips = Vec::with_capacity(planned.len());
    for (track_index, run_ids, merged) in planned {
        for clip_id in run_ids {
            store.remove_clip(clip_id)?;
        }
        let replacement = merged.clone();
        store.insert_clip(track_index, merged)?;
        merged_clips.push(replacement);
    }
    Ok(merged_clips)
}

/// Merge adjacent clips with the default tolerance.
pub fn glue_selection(
    store: &mut ClipStore,
    selected: &HashSet<ClipId>,
) -> Result<Vec<Clip>, ArrangementError> {
    glue_clips(store, selected, GLUE_TOLERANCE)
}

fn plan_run(track_index: usize, run: &[&Clip]) -> (usize, Vec<ClipId>, Clip) {
    let first = run[0];
    let last = run[run.len() - 1];
    let mut merged = Clip::new(first.start, last.end() - first.start);
    merged.fade_in = first.fade_in;
    merged.fade_out = last.fade_out;
    merged.asset_id = first.asset_id.clone();
    // Constituents, flattened through earlier glues.
    for clip in run {
        merged.merged_from.extend(clip.merged_from.iter().copied());
        merged.merged_from.push(clip.id);
    }
    (track_index, run.iter().map(|c| c.id).collect(), merged)
}

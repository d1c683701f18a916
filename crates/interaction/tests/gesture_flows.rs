//! Full gesture flows through the Arranger facade: pointer-down to commit
//! or cancel, with the store checked for atomicity after every outcome.

use arrangement::{Clip, SnapConfig, SnapMode};
use interaction::{
    Arranger, ClipEdge, FillStrategy, Grab, Modifiers, MoveOutcome, PointerPos, ResizeOutcome,
};

fn arranger() -> Arranger {
    let mut arranger = Arranger::new();
    arranger.add_track("Track 1");
    arranger.snap = SnapConfig { mode: SnapMode::Grid, ..Default::default() };
    arranger
}

#[test]
fn move_snaps_to_grid_on_commit() {
    let mut arranger = arranger();
    let a = arranger.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();

    // 100 px/s viewport: 230 px of travel is a raw delta of 2.3 s.
    arranger.begin_move(&[a], PointerPos::new(50.0, 60.0)).unwrap();
    let preview = arranger.update_move(PointerPos::new(280.0, 60.0)).unwrap();
    assert_eq!(preview.delta_time, 2.3);

    let outcome = arranger.commit_move(PointerPos::new(280.0, 60.0)).unwrap();
    assert!(matches!(outcome, MoveOutcome::Committed(_)));
    let clip = arranger.store().clip(a).unwrap();
    assert_eq!(clip.start, 2.5);
    assert_eq!(clip.end(), 6.5);
}

#[test]
fn blocked_move_reverts_entirely() {
    let mut arranger = arranger();
    arranger.snap.mode = SnapMode::Free;
    let a = arranger.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();
    let b = arranger.insert_clip(0, Clip::new(4.0, 4.0)).unwrap();

    // Raw target [3,7) overlaps B; every dodge candidate either collides
    // or leaves the timeline, so the move is rejected wholesale.
    arranger.begin_move(&[a], PointerPos::new(0.0, 60.0)).unwrap();
    let outcome = arranger.commit_move(PointerPos::new(300.0, 60.0)).unwrap();
    assert_eq!(outcome, MoveOutcome::Rejected);

    assert_eq!(arranger.store().clip(a).unwrap().start, 0.0);
    assert_eq!(arranger.store().clip(b).unwrap().start, 4.0);
    assert!(arranger.store().check_no_overlap());
    assert!(arranger.is_idle());
}

#[test]
fn group_move_commits_every_member_or_none() {
    let mut arranger = arranger();
    arranger.snap.mode = SnapMode::Free;
    arranger.add_track("Track 2");
    let a = arranger.insert_clip(0, Clip::new(0.0, 2.0)).unwrap();
    let b = arranger.insert_clip(0, Clip::new(3.0, 2.0)).unwrap();

    arranger.set_range_selection((0.0, 6.0), (0, 0));
    assert_eq!(arranger.selection().count(), 2);

    // Grab A's drag band and pull the group one track down, +10 s.
    let grab = arranger
        .grab_clip(a, PointerPos::new(100.0, 60.0), Modifiers::default())
        .unwrap();
    assert_eq!(grab, Grab::Move);
    let outcome = arranger.commit_move(PointerPos::new(1100.0, 140.0)).unwrap();
    assert!(matches!(outcome, MoveOutcome::Committed(_)));

    let clip_a = arranger.store().clip(a).unwrap();
    let clip_b = arranger.store().clip(b).unwrap();
    assert_eq!(clip_a.start, 10.0);
    assert_eq!(clip_b.start, 13.0);
    assert_eq!(arranger.store().clip_track_index(a), Some(1));
    assert_eq!(arranger.store().clip_track_index(b), Some(1));
    assert!(arranger.store().check_no_overlap());
}

#[test]
fn extension_waits_for_a_strategy() {
    let mut arranger = arranger();
    let a = arranger.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();

    arranger
        .begin_resize(a, ClipEdge::Right, PointerPos::new(400.0, 40.0))
        .unwrap();
    let update = arranger.update_resize(PointerPos::new(600.0, 40.0)).unwrap();
    assert_eq!(update.preview.duration, 6.0);
    let proposal = update.proposal.expect("growth past original bounds");
    assert_eq!(proposal.extension_start, 4.0);
    assert_eq!(proposal.extension_end, 6.0);
    assert_eq!(proposal.extension_length, 2.0);

    let outcome = arranger.finish_resize(PointerPos::new(600.0, 40.0)).unwrap();
    assert!(matches!(outcome, ResizeOutcome::Pending(_)));
    // Nothing committed yet.
    assert_eq!(arranger.store().clip(a).unwrap().duration, 4.0);

    let (clip, fill) = arranger.resolve_extension(FillStrategy::Silence).unwrap();
    assert_eq!(clip.start, 0.0);
    assert_eq!(clip.duration, 6.0);
    assert_eq!(fill.region_start, 4.0);
    assert_eq!(fill.region_end, 6.0);
    assert_eq!(fill.strategy, FillStrategy::Silence);
    assert_eq!(arranger.store().clip(a).unwrap().duration, 6.0);
}

#[test]
fn cancelled_extension_leaves_clip_bit_identical() {
    let mut arranger = arranger();
    let a = arranger.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();
    let before = arranger.store().clone();

    arranger
        .begin_resize(a, ClipEdge::Right, PointerPos::new(400.0, 40.0))
        .unwrap();
    arranger.update_resize(PointerPos::new(700.0, 40.0)).unwrap();
    let outcome = arranger.finish_resize(PointerPos::new(700.0, 40.0)).unwrap();
    assert!(matches!(outcome, ResizeOutcome::Pending(_)));

    arranger.cancel_extension().unwrap();
    assert_eq!(*arranger.store(), before);
    assert!(arranger.is_idle());
}

#[test]
fn shrink_commits_directly() {
    let mut arranger = arranger();
    let a = arranger.insert_clip(0, Clip::new(2.0, 4.0)).unwrap();

    arranger
        .begin_resize(a, ClipEdge::Left, PointerPos::new(200.0, 40.0))
        .unwrap();
    let outcome = arranger.finish_resize(PointerPos::new(300.0, 40.0)).unwrap();
    let ResizeOutcome::Committed(clip) = outcome else {
        panic!("expected a direct commit");
    };
    assert_eq!(clip.start, 3.0);
    assert_eq!(clip.duration, 3.0);
    assert!(arranger.is_idle());
}

#[test]
fn glue_merges_adjacent_runs_and_clears_selection() {
    let mut arranger = arranger();
    let a = arranger.insert_clip(0, Clip::new(0.0, 2.0)).unwrap();
    let b = arranger.insert_clip(0, Clip::new(2.05, 1.95)).unwrap();
    let c = arranger.insert_clip(0, Clip::new(10.0, 2.0)).unwrap();

    arranger.set_range_selection((0.0, 12.0), (0, 0));
    assert_eq!(arranger.selection().count(), 3);

    let merged = arranger.glue_selection().unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].start, 0.0);
    assert_eq!(merged[0].end(), 4.0);
    assert_eq!(merged[0].merged_from, vec![a, b]);
    assert!(arranger.store().clip(c).is_some());
    assert!(arranger.selection().is_empty());
    assert!(arranger.store().check_no_overlap());
}

#[test]
fn range_selection_sweep_then_click_to_clear() {
    let mut arranger = arranger();
    arranger.add_track("Track 2");
    let a = arranger.insert_clip(0, Clip::new(0.0, 2.0)).unwrap();
    let b = arranger.insert_clip(1, Clip::new(1.0, 2.0)).unwrap();

    // Sweep from (1.5s, track 0) to (2.5s, track 1).
    arranger.begin_range_selection(PointerPos::new(150.0, 40.0)).unwrap();
    arranger.update_range_selection(PointerPos::new(250.0, 120.0)).unwrap();
    let selected = arranger
        .finish_range_selection(PointerPos::new(250.0, 120.0))
        .unwrap();
    assert!(selected.contains(&a) && selected.contains(&b));

    // A sub-threshold sweep is a click and clears everything.
    arranger.begin_range_selection(PointerPos::new(500.0, 40.0)).unwrap();
    let selected = arranger
        .finish_range_selection(PointerPos::new(501.0, 41.0))
        .unwrap();
    assert!(selected.is_empty());
}

#[test]
fn cancelled_move_restores_pre_gesture_state() {
    let mut arranger = arranger();
    let a = arranger.insert_clip(0, Clip::new(0.0, 4.0)).unwrap();
    let before = arranger.store().clone();

    arranger.begin_move(&[a], PointerPos::new(0.0, 60.0)).unwrap();
    arranger.update_move(PointerPos::new(500.0, 60.0)).unwrap();
    arranger.escape();

    assert_eq!(*arranger.store(), before);
    assert!(arranger.is_idle());
}

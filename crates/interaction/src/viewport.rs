use serde::{Deserialize, Serialize};

use arrangement::Seconds;

/// Pointer position in timeline content space: x in pixels from time zero,
/// y in pixels from the top of track 0. Scroll/header offsets are the UI
/// layer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
}

/// Pixel <-> time/track mapping for the current view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub base_pixels_per_second: f32,
    pub zoom: f32,
    pub track_height: f32,
    /// Width of the resize handles at a clip's edges.
    pub edge_handle_px: f32,
    /// Pointer travel below this is a click, not a drag.
    pub click_threshold_px: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            base_pixels_per_second: 100.0,
            zoom: 1.0,
            track_height: 80.0,
            edge_handle_px: 10.0,
            click_threshold_px: 3.0,
        }
    }
}

impl Viewport {
    pub fn pixels_per_second(&self) -> f32 {
        self.base_pixels_per_second * self.zoom
    }

    pub fn dx_to_seconds(&self, dx: f32) -> Seconds {
        dx as Seconds / self.pixels_per_second() as Seconds
    }

    pub fn seconds_to_px(&self, seconds: Seconds) -> f32 {
        seconds as f32 * self.pixels_per_second()
    }

    pub fn dy_to_track_delta(&self, dy: f32) -> i64 {
        (dy / self.track_height).round() as i64
    }

    pub fn time_at_x(&self, x: f32) -> Seconds {
        x.max(0.0) as Seconds / self.pixels_per_second() as Seconds
    }

    pub fn track_at_y(&self, y: f32, track_count: usize) -> usize {
        if track_count == 0 {
            return 0;
        }
        let index = (y / self.track_height).floor();
        (index.max(0.0) as usize).min(track_count - 1)
    }

    pub fn is_click(&self, origin: PointerPos, current: PointerPos) -> bool {
        let dx = current.x - origin.x;
        let dy = current.y - origin.y;
        (dx * dx + dy * dy).sqrt() <= self.click_threshold_px
    }
}

/// Where within a clip the pointer grabbed it. Only the drag band starts
/// a move session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabZone {
    LeftHandle,
    RightHandle,
    /// Upper half of the clip body.
    SelectBand,
    /// Lower half of the clip body.
    DragBand,
}

impl GrabZone {
    /// Classify a grab from coordinates local to the clip's rect.
    pub fn classify(viewport: &Viewport, local_x: f32, local_y: f32, clip_width_px: f32) -> Self {
        // Handles shrink on very narrow clips so the body stays grabbable.
        let handle = viewport.edge_handle_px.min(clip_width_px / 3.0);
        if local_x <= handle {
            GrabZone::LeftHandle
        } else if local_x >= clip_width_px - handle {
            GrabZone::RightHandle
        } else if local_y < viewport.track_height / 2.0 {
            GrabZone::SelectBand
        } else {
            GrabZone::DragBand
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_time_conversion_respects_zoom() {
        let viewport = Viewport { zoom: 2.0, ..Default::default() };
        assert_eq!(viewport.pixels_per_second(), 200.0);
        assert_eq!(viewport.dx_to_seconds(100.0), 0.5);
        assert_eq!(viewport.time_at_x(300.0), 1.5);
    }

    #[test]
    fn track_delta_rounds() {
        let viewport = Viewport::default();
        assert_eq!(viewport.dy_to_track_delta(39.0), 0);
        assert_eq!(viewport.dy_to_track_delta(41.0), 1);
        assert_eq!(viewport.dy_to_track_delta(-41.0), -1);
    }

    #[test]
    fn track_at_y_clamps() {
        let viewport = Viewport::default();
        assert_eq!(viewport.track_at_y(-10.0, 3), 0);
        assert_eq!(viewport.track_at_y(90.0, 3), 1);
        assert_eq!(viewport.track_at_y(1000.0, 3), 2);
    }

    #[test]
    fn grab_zones() {
        let viewport = Viewport::default();
        assert_eq!(GrabZone::classify(&viewport, 4.0, 10.0, 200.0), GrabZone::LeftHandle);
        assert_eq!(GrabZone::classify(&viewport, 195.0, 10.0, 200.0), GrabZone::RightHandle);
        assert_eq!(GrabZone::classify(&viewport, 100.0, 10.0, 200.0), GrabZone::SelectBand);
        assert_eq!(GrabZone::classify(&viewport, 100.0, 60.0, 200.0), GrabZone::DragBand);
    }

    #[test]
    fn narrow_clip_keeps_a_body() {
        let viewport = Viewport::default();
        // 12px clip: handles shrink to 4px each.
        assert_eq!(GrabZone::classify(&viewport, 6.0, 60.0, 12.0), GrabZone::DragBand);
    }
}

use serde::{Deserialize, Serialize};

use crate::Seconds;

/// Snap policy for normalizing raw pointer times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnapMode {
    /// No snapping; times pass through unchanged.
    Free,
    /// Fixed interval grid (`SnapConfig::grid_interval`).
    #[default]
    Grid,
    /// One beat: `60 / bpm` seconds.
    Beat,
    /// One measure: `numerator * 60 / bpm` seconds.
    Measure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { numerator: 4, denominator: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapConfig {
    pub mode: SnapMode,
    pub bpm: f64,
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Interval for `SnapMode::Grid`, in seconds.
    pub grid_interval: Seconds,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            mode: SnapMode::Grid,
            bpm: 120.0,
            time_signature: TimeSignature::default(),
            grid_interval: 0.5,
        }
    }
}

impl SnapConfig {
    /// Snap interval in seconds, or `None` when no snapping applies.
    fn interval(&self) -> Option<Seconds> {
        let interval = match self.mode {
            SnapMode::Free => return None,
            SnapMode::Grid => self.grid_interval,
            SnapMode::Beat => 60.0 / self.bpm,
            SnapMode::Measure => self.time_signature.numerator as f64 * 60.0 / self.bpm,
        };
        // A non-positive bpm or grid would make the division meaningless;
        // treat it as free rather than failing mid-gesture.
        (interval.is_finite() && interval > 0.0).then_some(interval)
    }
}

/// Round `time` to the nearest snap position and clamp to `>= 0`.
pub fn snap(time: Seconds, config: &SnapConfig) -> Seconds {
    match config.interval() {
        None => time.max(0.0),
        Some(interval) => ((time / interval).round() * interval).max(0.0),
    }
}

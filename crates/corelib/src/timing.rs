//! Frame-time accounting for the once-per-second ms/frame report.

use std::time::Duration;

/// Counts frames and reports the average frame time once per elapsed second.
#[derive(Clone, Debug, Default)]
pub struct FrameCounter {
    frames: u32,
    accumulated: Duration,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame of length `dt`. Returns the average ms/frame when at least
    /// a second has accumulated; the remainder carries over to the next window.
    pub fn tick(&mut self, dt: Duration) -> Option<f64> {
        self.frames += 1;
        self.accumulated += dt;
        if self.accumulated < Duration::from_secs(1) {
            return None;
        }
        let ms_per_frame = 1000.0 / f64::from(self.frames);
        self.frames = 0;
        self.accumulated -= Duration::from_secs(1);
        Some(ms_per_frame)
    }
}

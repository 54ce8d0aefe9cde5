// Gaze region selector: relative, re-anchored displacement detector over the 3x3 grid.
// A move needs a displacement of at least the threshold against a recent baseline, never an absolute gaze fix.
// See DESIGN.md: Gaze Region Selector

use serde::Serialize;
use tracing::{debug, info};

use crate::mapper::CoordinateMapper;
use crate::types::*;

/// Result of feeding one gaze sample to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GazeUpdate {
    /// Inside the post-switch settle window; sample ignored.
    Settling,
    /// Baseline (re)set; region unchanged.
    Anchored,
    /// Displacement under the threshold, or the move would leave the grid.
    Held,
    Moved { from: ActiveRegion, to: ActiveRegion },
}

/// Owns the active region. One instance per page interpretation context.
#[derive(Debug, Clone)]
pub struct GazeRegionSelector {
    settings: GazeSettings,
    region: ActiveRegion,
    baseline: Option<GazeBaseline>,
    cooldown_until: Option<Timestamp>,
}

impl GazeRegionSelector {
    pub fn new(settings: GazeSettings) -> Self {
        GazeRegionSelector {
            settings,
            region: ActiveRegion::default(),
            baseline: None,
            cooldown_until: None,
        }
    }

    pub fn region(&self) -> ActiveRegion {
        self.region
    }

    pub fn baseline(&self) -> Option<GazeBaseline> {
        self.baseline
    }

    pub fn update(
        &mut self,
        sample: GazeSample,
        mapper: &CoordinateMapper,
        now: Timestamp,
    ) -> GazeUpdate {
        if let Some(until) = self.cooldown_until {
            if now < until {
                return GazeUpdate::Settling;
            }
            self.cooldown_until = None;
        }

        let point = mapper.to_normalized(sample.x, sample.y);

        let baseline = match self.baseline {
            Some(b) if now.millis_since(b.timestamp) <= self.settings.baseline_window_ms => b,
            _ => {
                self.baseline = Some(GazeBaseline {
                    point,
                    timestamp: now,
                });
                return GazeUpdate::Anchored;
            }
        };

        let dx = point.x - baseline.point.x;
        let dy = point.y - baseline.point.y;
        let threshold = self.settings.displacement_threshold;

        // Column first; a column move blocked by the grid edge falls through to the row.
        let column = (dx.abs() >= threshold)
            .then(|| self.region.shifted(0, step(dx)))
            .flatten();
        let target = column.or_else(|| {
            (dy.abs() >= threshold)
                .then(|| self.region.shifted(step(dy), 0))
                .flatten()
        });

        match target {
            Some(to) => {
                let from = self.region;
                self.region = to;
                self.baseline = None;
                self.cooldown_until = Some(now.plus_millis(self.settings.settle_ms));
                info!(
                    row = to.row(),
                    col = to.col(),
                    dx,
                    dy,
                    "gaze moved active region"
                );
                GazeUpdate::Moved { from, to }
            }
            None => {
                debug!(dx, dy, "gaze displacement held");
                GazeUpdate::Held
            }
        }
    }
}

impl Default for GazeRegionSelector {
    fn default() -> Self {
        Self::new(GazeSettings::default())
    }
}

fn step(delta: f32) -> i8 {
    if delta > 0.0 {
        1
    } else {
        -1
    }
}

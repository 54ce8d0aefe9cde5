// Camera-space to screen-space mapping: mirror, ROI crop, then placement in the active grid cell.
// Coarse position comes from the gaze-selected cell, fine position from the hand.

use crate::types::*;

/// Maps normalized landmark and gaze points to viewport coordinates.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    settings: MappingSettings,
}

impl CoordinateMapper {
    pub fn new(settings: MappingSettings) -> Self {
        CoordinateMapper { settings }
    }

    /// Mirror and crop a raw camera-frame point to the unit square.
    pub fn to_normalized(&self, x: f32, y: f32) -> NormalizedCoord {
        let x = if self.settings.mirror_x { 1.0 - x } else { x };
        let roi = &self.settings.roi;
        NormalizedCoord::new(
            (x - roi.x_min) / (roi.x_max - roi.x_min),
            (y - roi.y_min) / (roi.y_max - roi.y_min),
        )
    }

    /// Place a unit-square point inside the active cell, clamped to the viewport.
    pub fn to_screen(
        &self,
        point: NormalizedCoord,
        region: ActiveRegion,
        viewport: ViewportSize,
    ) -> ScreenPoint {
        let cell_w = viewport.width / GRID_SIZE as f32;
        let cell_h = viewport.height / GRID_SIZE as f32;
        let center_x = cell_w * (region.col() as f32 + 0.5);
        let center_y = cell_h * (region.row() as f32 + 0.5);
        let span_w = cell_w * self.settings.region_coverage;
        let span_h = cell_h * self.settings.region_coverage;

        ScreenPoint::new(
            (center_x + (point.x - 0.5) * span_w).clamp(0.0, viewport.width),
            (center_y + (point.y - 0.5) * span_h).clamp(0.0, viewport.height),
        )
    }

    /// Full landmark-to-screen mapping.
    pub fn map_landmark(
        &self,
        landmark: LandmarkPoint,
        region: ActiveRegion,
        viewport: ViewportSize,
    ) -> ScreenPoint {
        self.to_screen(self.to_normalized(landmark.x, landmark.y), region, viewport)
    }

    /// Grid cell containing a screen point. Points on the far edges belong to the last cell.
    pub fn region_at(&self, point: ScreenPoint, viewport: ViewportSize) -> ActiveRegion {
        let cell = |value: f32, extent: f32| -> u8 {
            if extent <= 0.0 {
                return 1;
            }
            let index = (value / extent * GRID_SIZE as f32).floor();
            index.clamp(0.0, (GRID_SIZE - 1) as f32) as u8
        };
        ActiveRegion::new(
            cell(point.y, viewport.height),
            cell(point.x, viewport.width),
        )
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(MappingSettings::default())
    }
}

// Strong typing over raw floats. Newtypes for timestamps, tab ids, landmarks, and screen units.
// See DESIGN.md: Data model / Configuration

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Wall-clock timestamp in milliseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`. Zero if `earlier` is in the future.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn plus_millis(&self, ms: u64) -> Self {
        Timestamp(self.0.saturating_add(ms))
    }
}

/// Browser tab id. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(i32);

impl TabId {
    pub fn new(id: i32) -> Self {
        TabId(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

/// One tracked anatomical point, normalized to the camera frame (`y` grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        LandmarkPoint { x, y, z: 0.0 }
    }
}

/// Number of points in a complete hand landmark set.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// One hand's landmarks in fixed anatomical order. A short set is tolerated:
/// missing indices read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HandLandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl HandLandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        HandLandmarkSet { points }
    }

    pub fn get(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= HAND_LANDMARK_COUNT
    }
}

/// Averaged iris position, normalized to the camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GazeSample {
    pub x: f32,
    pub y: f32,
}

/// Normalized coordinate (0.0 to 1.0, resolution-independent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizedCoord {
    pub x: f32,
    pub y: f32,
}

impl NormalizedCoord {
    pub fn new(x: f32, y: f32) -> Self {
        NormalizedCoord {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    pub fn center() -> Self {
        NormalizedCoord { x: 0.5, y: 0.5 }
    }
}

/// Point on screen in CSS pixels, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        ScreenPoint { x, y }
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        ViewportSize { width, height }
    }
}

/// Cells per side of the viewport grid.
pub const GRID_SIZE: u8 = 3;

/// Selected cell of the 3x3 viewport grid. Both coordinates stay within `0..GRID_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActiveRegion {
    row: u8,
    col: u8,
}

impl ActiveRegion {
    pub fn new(row: u8, col: u8) -> Self {
        ActiveRegion {
            row: row.min(GRID_SIZE - 1),
            col: col.min(GRID_SIZE - 1),
        }
    }

    pub fn center() -> Self {
        ActiveRegion { row: 1, col: 1 }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// Neighbouring cell, or `None` when the step leaves the grid.
    pub fn shifted(&self, d_row: i8, d_col: i8) -> Option<ActiveRegion> {
        let row = self.row as i16 + d_row as i16;
        let col = self.col as i16 + d_col as i16;
        let range = 0..GRID_SIZE as i16;
        if range.contains(&row) && range.contains(&col) {
            Some(ActiveRegion {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }
}

impl Default for ActiveRegion {
    fn default() -> Self {
        ActiveRegion::center()
    }
}

/// Anchor for relative gaze displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeBaseline {
    pub point: NormalizedCoord,
    pub timestamp: Timestamp,
}

/// Direction of a tab switch along the tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabDirection {
    Previous,
    Next,
}

impl TabDirection {
    pub fn offset(&self) -> i32 {
        match self {
            TabDirection::Previous => -1,
            TabDirection::Next => 1,
        }
    }
}

/// Discrete action produced by gesture recognition. Built and consumed within one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GestureEvent {
    TabSwitch { direction: TabDirection },
    ScrollContinuous { delta_y: f32, at: ScreenPoint },
    PinchClick { at: ScreenPoint },
}

/// Messages relayed from the inference context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "HAND_DATA")]
    HandData { landmarks: HandLandmarkSet },
    #[serde(rename = "GAZE_DATA")]
    GazeData { gaze: GazeSample },
}

impl InboundMessage {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidMessage(e.to_string()))
    }
}

/// Which way a positive index/middle horizontal offset switches tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TabPolarity {
    /// Mirrored camera: positive offset moves to the previous tab.
    #[default]
    Mirrored,
    /// Positive offset moves to the next tab.
    Direct,
}

impl TabPolarity {
    pub fn direction_for(&self, offset: f32) -> TabDirection {
        let positive = offset > 0.0;
        match (self, positive) {
            (TabPolarity::Mirrored, true) | (TabPolarity::Direct, false) => TabDirection::Previous,
            (TabPolarity::Mirrored, false) | (TabPolarity::Direct, true) => TabDirection::Next,
        }
    }
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub gestures: GestureSettings,
    #[serde(default)]
    pub gaze: GazeSettings,
    #[serde(default)]
    pub mapping: MappingSettings,
    /// Hand samples older than this are not interpreted (milliseconds).
    #[serde(default = "default_stale_after")]
    pub stale_after_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gestures: GestureSettings::default(),
            gaze: GazeSettings::default(),
            mapping: MappingSettings::default(),
            stale_after_ms: default_stale_after(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let roi = &self.mapping.roi;
        if !(roi.x_min < roi.x_max && roi.y_min < roi.y_max) {
            return Err(EngineError::InvalidConfig(format!(
                "empty region of interest: x [{}, {}], y [{}, {}]",
                roi.x_min, roi.x_max, roi.y_min, roi.y_max
            )));
        }
        let coverage = self.mapping.region_coverage;
        if !(coverage > 0.0 && coverage <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "region_coverage must be in (0, 1], got {}",
                coverage
            )));
        }
        let g = &self.gestures;
        for (name, value) in [
            ("tab_direction_threshold", g.tab_direction_threshold),
            ("pinch_threshold", g.pinch_threshold),
            ("max_scroll_speed", g.max_scroll_speed),
            ("scroll_direction_threshold", g.scroll_direction_threshold),
            ("gaze.displacement_threshold", self.gaze.displacement_threshold),
        ] {
            if !(value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Gesture classifier thresholds and cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSettings {
    #[serde(default = "default_tab_cooldown")]
    pub tab_switch_cooldown_ms: u64,
    #[serde(default = "default_pinch_cooldown")]
    pub pinch_cooldown_ms: u64,
    /// Dead band for the averaged index/middle horizontal offset (normalized).
    #[serde(default = "default_tab_threshold")]
    pub tab_direction_threshold: f32,
    #[serde(default)]
    pub tab_polarity: TabPolarity,
    /// Maximum index-thumb tip distance that counts as a pinch (normalized).
    #[serde(default = "default_pinch_threshold")]
    pub pinch_threshold: f32,
    /// Pixels per dispatch at full bend.
    #[serde(default = "default_max_scroll_speed")]
    pub max_scroll_speed: f32,
    /// Minimum |y| of the unit index-tip direction for scroll intent.
    #[serde(default = "default_scroll_direction_threshold")]
    pub scroll_direction_threshold: f32,
    /// Index tip-DIP segments shorter than this carry no direction (normalized).
    #[serde(default = "default_scroll_min_magnitude")]
    pub scroll_min_magnitude: f32,
    #[serde(default = "default_thumb_dead_zone")]
    pub thumb_dead_zone: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        GestureSettings {
            tab_switch_cooldown_ms: default_tab_cooldown(),
            pinch_cooldown_ms: default_pinch_cooldown(),
            tab_direction_threshold: default_tab_threshold(),
            tab_polarity: TabPolarity::default(),
            pinch_threshold: default_pinch_threshold(),
            max_scroll_speed: default_max_scroll_speed(),
            scroll_direction_threshold: default_scroll_direction_threshold(),
            scroll_min_magnitude: default_scroll_min_magnitude(),
            thumb_dead_zone: default_thumb_dead_zone(),
        }
    }
}

/// Gaze region selector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazeSettings {
    /// Relative displacement needed to move one cell (normalized ROI units).
    #[serde(default = "default_gaze_threshold")]
    pub displacement_threshold: f32,
    /// Baselines older than this are re-anchored (milliseconds).
    #[serde(default = "default_baseline_window")]
    pub baseline_window_ms: u64,
    /// Samples are ignored for this long after a region change (milliseconds).
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
}

impl Default for GazeSettings {
    fn default() -> Self {
        GazeSettings {
            displacement_threshold: default_gaze_threshold(),
            baseline_window_ms: default_baseline_window(),
            settle_ms: default_settle(),
        }
    }
}

/// Usable sub-rectangle of the normalized camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for RoiRect {
    fn default() -> Self {
        RoiRect {
            x_min: 0.15,
            x_max: 0.85,
            y_min: 0.30,
            y_max: 1.00,
        }
    }
}

/// Coordinate mapping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSettings {
    #[serde(default)]
    pub roi: RoiRect,
    /// Share of a cell's dimensions the hand range spans.
    #[serde(default = "default_region_coverage")]
    pub region_coverage: f32,
    #[serde(default = "default_true")]
    pub mirror_x: bool,
}

impl Default for MappingSettings {
    fn default() -> Self {
        MappingSettings {
            roi: RoiRect::default(),
            region_coverage: default_region_coverage(),
            mirror_x: default_true(),
        }
    }
}

fn default_stale_after() -> u64 {
    250
}

fn default_tab_cooldown() -> u64 {
    1000
}

fn default_pinch_cooldown() -> u64 {
    500
}

fn default_tab_threshold() -> f32 {
    0.02
}

fn default_pinch_threshold() -> f32 {
    0.05
}

fn default_max_scroll_speed() -> f32 {
    40.0
}

fn default_scroll_direction_threshold() -> f32 {
    0.5
}

fn default_scroll_min_magnitude() -> f32 {
    0.02
}

fn default_thumb_dead_zone() -> f32 {
    0.005
}

fn default_gaze_threshold() -> f32 {
    0.04
}

fn default_baseline_window() -> u64 {
    1000
}

fn default_settle() -> u64 {
    1000
}

fn default_region_coverage() -> f32 {
    0.6
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_arithmetic() {
        let ts = Timestamp::from_millis(1_500);
        assert_eq!(ts.plus_millis(500).as_millis(), 2_000);
        assert_eq!(ts.millis_since(Timestamp::from_millis(1_000)), 500);
        assert_eq!(Timestamp::from_millis(10).millis_since(ts), 0);
    }

    #[test]
    fn normalized_coord_clamps() {
        let coord = NormalizedCoord::new(1.5, -0.5);
        assert_eq!(coord.x, 1.0);
        assert_eq!(coord.y, 0.0);
    }

    #[test]
    fn active_region_stays_on_grid() {
        let corner = ActiveRegion::new(2, 2);
        assert_eq!(corner.shifted(0, 1), None);
        assert_eq!(corner.shifted(1, 0), None);
        assert_eq!(corner.shifted(-1, 0), Some(ActiveRegion::new(1, 2)));
        assert_eq!(ActiveRegion::new(0, 0).shifted(0, -1), None);
        assert_eq!(ActiveRegion::new(7, 9), ActiveRegion::new(2, 2));
    }

    #[test]
    fn active_region_serializes_clamped_cell() {
        let json = serde_json::to_string(&ActiveRegion::new(7, 9)).unwrap();
        assert_eq!(json, r#"{"row":2,"col":2}"#);
    }

    #[test]
    fn hand_message_parses_without_z() {
        let json = r#"{"type":"HAND_DATA","landmarks":[{"x":0.1,"y":0.2},{"x":0.3,"y":0.4,"z":-0.01}]}"#;
        let msg = InboundMessage::from_json(json).unwrap();
        match msg {
            InboundMessage::HandData { landmarks } => {
                assert_eq!(landmarks.len(), 2);
                assert_eq!(landmarks.get(0).unwrap().z, 0.0);
                assert!(landmarks.get(5).is_none());
                assert!(!landmarks.is_complete());
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn gaze_message_parses() {
        let msg = InboundMessage::from_json(r#"{"type":"GAZE_DATA","gaze":{"x":0.5,"y":0.6}}"#)
            .unwrap();
        assert_eq!(
            msg,
            InboundMessage::GazeData {
                gaze: GazeSample { x: 0.5, y: 0.6 }
            }
        );
    }

    #[test]
    fn unknown_message_type_rejected() {
        let err = InboundMessage::from_json(r#"{"type":"FACE_DATA"}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMessage(_)));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.gestures.tab_switch_cooldown_ms, 1000);
        assert_eq!(config.gestures.pinch_cooldown_ms, 500);
        assert_eq!(config.gestures.tab_polarity, TabPolarity::Mirrored);
        assert_eq!(config.gaze.displacement_threshold, 0.04);
        assert_eq!(config.mapping.roi, RoiRect::default());
        assert_eq!(config.mapping.region_coverage, 0.6);
        assert!(config.mapping.mirror_x);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config =
            EngineConfig::from_json(r#"{"gestures":{"tab_polarity":"Direct"}}"#).unwrap();
        assert_eq!(config.gestures.tab_polarity, TabPolarity::Direct);
        assert_eq!(config.gestures.max_scroll_speed, 40.0);
    }

    #[test]
    fn inverted_roi_rejected() {
        let json = r#"{"mapping":{"roi":{"x_min":0.8,"x_max":0.2,"y_min":0.0,"y_max":1.0}}}"#;
        assert!(matches!(
            EngineConfig::from_json(json),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_coverage_rejected() {
        let json = r#"{"mapping":{"region_coverage":0.0}}"#;
        assert!(EngineConfig::from_json(json).is_err());
    }

    #[test]
    fn polarity_maps_offset_sign() {
        assert_eq!(TabPolarity::Mirrored.direction_for(0.05), TabDirection::Previous);
        assert_eq!(TabPolarity::Mirrored.direction_for(-0.05), TabDirection::Next);
        assert_eq!(TabPolarity::Direct.direction_for(0.05), TabDirection::Next);
        assert_eq!(TabPolarity::Direct.direction_for(-0.05), TabDirection::Previous);
    }
}

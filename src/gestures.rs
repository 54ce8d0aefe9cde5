// Gesture trigger engine: ordered recognizers gated by per-kind cooldowns.
// Scroll is continuous and never gated; tab switch and pinch click are rate limited.
// See DESIGN.md: Gesture Debouncer / Trigger Engine

use tracing::{debug, info};

use crate::geometry::{self, Finger, Reference};
use crate::types::*;

/// Gesture kinds that carry a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    TabSwitch,
    PinchClick,
}

impl GestureEvent {
    /// Cooldown bucket for this event, `None` for continuous gestures.
    pub fn kind(&self) -> Option<GestureKind> {
        match self {
            GestureEvent::TabSwitch { .. } => Some(GestureKind::TabSwitch),
            GestureEvent::PinchClick { .. } => Some(GestureKind::PinchClick),
            GestureEvent::ScrollContinuous { .. } => None,
        }
    }
}

/// Last-fired timestamp per rate-limited kind.
#[derive(Debug, Clone, Default)]
pub struct CooldownState {
    tab_switch: Option<Timestamp>,
    pinch_click: Option<Timestamp>,
}

impl CooldownState {
    pub fn last_fired(&self, kind: GestureKind) -> Option<Timestamp> {
        match kind {
            GestureKind::TabSwitch => self.tab_switch,
            GestureKind::PinchClick => self.pinch_click,
        }
    }

    fn record(&mut self, kind: GestureKind, now: Timestamp) {
        match kind {
            GestureKind::TabSwitch => self.tab_switch = Some(now),
            GestureKind::PinchClick => self.pinch_click = Some(now),
        }
    }
}

/// Cooldown gate for discrete gestures.
#[derive(Debug, Clone)]
pub struct Debouncer {
    tab_switch_ms: u64,
    pinch_click_ms: u64,
    state: CooldownState,
}

impl Debouncer {
    pub fn new(settings: &GestureSettings) -> Self {
        Debouncer {
            tab_switch_ms: settings.tab_switch_cooldown_ms,
            pinch_click_ms: settings.pinch_cooldown_ms,
            state: CooldownState::default(),
        }
    }

    fn window(&self, kind: GestureKind) -> u64 {
        match kind {
            GestureKind::TabSwitch => self.tab_switch_ms,
            GestureKind::PinchClick => self.pinch_click_ms,
        }
    }

    pub fn is_ready(&self, kind: GestureKind, now: Timestamp) -> bool {
        match self.state.last_fired(kind) {
            Some(last) => now.millis_since(last) >= self.window(kind),
            None => true,
        }
    }

    /// Fire if ready. Returns whether the kind fired and its cooldown restarted.
    pub fn try_fire(&mut self, kind: GestureKind, now: Timestamp) -> bool {
        if !self.is_ready(kind, now) {
            return false;
        }
        self.state.record(kind, now);
        true
    }

    pub fn state(&self) -> &CooldownState {
        &self.state
    }
}

/// Per-sample input to recognizers.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub hand: &'a HandLandmarkSet,
    /// Index fingertip mapped to the screen. Absent outside the page context.
    pub pointer: Option<ScreenPoint>,
}

/// Pose predicate plus payload builder for one gesture.
pub trait Recognizer {
    fn name(&self) -> &'static str;

    /// Event for this frame if the pose holds. Cooldowns are applied by the engine.
    fn recognize(&self, input: &FrameInput<'_>, settings: &GestureSettings) -> Option<GestureEvent>;
}

/// Index and middle up and leaning sideways; ring, pinky, and thumb folded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabSwitchRecognizer;

impl TabSwitchRecognizer {
    fn pose_holds(hand: &HandLandmarkSet, settings: &GestureSettings) -> Option<bool> {
        Some(
            geometry::is_extended(hand, Finger::Index, Reference::Pip)?
                && geometry::is_extended(hand, Finger::Middle, Reference::Pip)?
                && geometry::is_curled(hand, Finger::Ring, Reference::Pip)?
                && geometry::is_curled(hand, Finger::Pinky, Reference::Pip)?
                && geometry::is_thumb_curled(hand, settings.thumb_dead_zone)?,
        )
    }
}

impl Recognizer for TabSwitchRecognizer {
    fn name(&self) -> &'static str {
        "tab_switch"
    }

    fn recognize(&self, input: &FrameInput<'_>, settings: &GestureSettings) -> Option<GestureEvent> {
        if !Self::pose_holds(input.hand, settings)? {
            return None;
        }
        let offset = geometry::horizontal_offset(input.hand)?;
        if offset.abs() <= settings.tab_direction_threshold {
            return None;
        }
        Some(GestureEvent::TabSwitch {
            direction: settings.tab_polarity.direction_for(offset),
        })
    }
}

/// Fist with the index finger pointing up or down. Speed follows the index bend angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FistScrollRecognizer;

impl FistScrollRecognizer {
    fn pose_holds(hand: &HandLandmarkSet, settings: &GestureSettings) -> Option<bool> {
        Some(
            geometry::is_curled(hand, Finger::Middle, Reference::Mcp)?
                && geometry::is_curled(hand, Finger::Ring, Reference::Mcp)?
                && geometry::is_curled(hand, Finger::Pinky, Reference::Mcp)?
                && geometry::is_thumb_curled(hand, settings.thumb_dead_zone)?,
        )
    }
}

impl Recognizer for FistScrollRecognizer {
    fn name(&self) -> &'static str {
        "fist_scroll"
    }

    fn recognize(&self, input: &FrameInput<'_>, settings: &GestureSettings) -> Option<GestureEvent> {
        if !Self::pose_holds(input.hand, settings)? {
            return None;
        }
        let intent = geometry::scroll_intent(
            input.hand,
            settings.scroll_direction_threshold,
            settings.scroll_min_magnitude,
        )?;
        let speed = geometry::scroll_speed(intent.bend_angle, settings.max_scroll_speed);
        if speed <= f32::EPSILON {
            return None;
        }
        Some(GestureEvent::ScrollContinuous {
            delta_y: intent.direction.sign() * speed,
            at: input.pointer?,
        })
    }
}

/// Index and thumb tips together with the thumb out. A folded thumb belongs to the scroll pose.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinchClickRecognizer;

impl Recognizer for PinchClickRecognizer {
    fn name(&self) -> &'static str {
        "pinch_click"
    }

    fn recognize(&self, input: &FrameInput<'_>, settings: &GestureSettings) -> Option<GestureEvent> {
        if geometry::is_thumb_curled(input.hand, settings.thumb_dead_zone)? {
            return None;
        }
        if geometry::pinch_distance(input.hand)? > settings.pinch_threshold {
            return None;
        }
        Some(GestureEvent::PinchClick { at: input.pointer? })
    }
}

/// Evaluates recognizers in priority order; the first satisfied one wins the frame.
pub struct GestureEngine {
    settings: GestureSettings,
    recognizers: Vec<Box<dyn Recognizer>>,
    debouncer: Debouncer,
}

impl GestureEngine {
    pub fn new(settings: GestureSettings, recognizers: Vec<Box<dyn Recognizer>>) -> Self {
        let debouncer = Debouncer::new(&settings);
        GestureEngine {
            settings,
            recognizers,
            debouncer,
        }
    }

    /// Page context vocabulary: scroll takes precedence over pinch.
    pub fn page(settings: GestureSettings) -> Self {
        Self::new(
            settings,
            vec![Box::new(FistScrollRecognizer), Box::new(PinchClickRecognizer)],
        )
    }

    /// Coordinator vocabulary: tab switching only.
    pub fn coordinator(settings: GestureSettings) -> Self {
        Self::new(settings, vec![Box::new(TabSwitchRecognizer)])
    }

    pub fn evaluate(&mut self, input: &FrameInput<'_>, now: Timestamp) -> Option<GestureEvent> {
        for recognizer in &self.recognizers {
            let Some(event) = recognizer.recognize(input, &self.settings) else {
                continue;
            };
            if let Some(kind) = event.kind() {
                if !self.debouncer.try_fire(kind, now) {
                    debug!(recognizer = recognizer.name(), "suppressed by cooldown");
                    continue;
                }
                info!(recognizer = recognizer.name(), ?event, "gesture fired");
            } else {
                debug!(recognizer = recognizer.name(), ?event, "gesture");
            }
            return Some(event);
        }
        None
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
}

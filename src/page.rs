// Page interpretation context: latest samples in, at most one dispatch per sample out.
// See DESIGN.md: Page Context

use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::dispatch::{ActionDispatcher, DispatchOutcome, Page};
use crate::gaze::{GazeRegionSelector, GazeUpdate};
use crate::geometry::INDEX_TIP;
use crate::gestures::{FrameInput, GestureEngine};
use crate::mapper::CoordinateMapper;
use crate::types::*;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct TickReport {
    pub gaze: Option<GazeUpdate>,
    pub outcome: Option<DispatchOutcome>,
}

#[derive(Debug, Clone)]
struct HandFrame {
    landmarks: HandLandmarkSet,
    received: Timestamp,
}

/// Per-page interpretation state. One per document, owned by the page's frame loop.
pub struct PageContext<C: Clock> {
    clock: C,
    mapper: CoordinateMapper,
    gaze: GazeRegionSelector,
    gestures: GestureEngine,
    dispatcher: ActionDispatcher,
    latest_hand: Option<HandFrame>,
    pending_gaze: Option<GazeSample>,
    stale_after_ms: u64,
}

impl<C: Clock> PageContext<C> {
    pub fn new(config: &EngineConfig, clock: C) -> Self {
        PageContext {
            clock,
            mapper: CoordinateMapper::new(config.mapping.clone()),
            gaze: GazeRegionSelector::new(config.gaze.clone()),
            gestures: GestureEngine::page(config.gestures.clone()),
            dispatcher: ActionDispatcher::new(),
            latest_hand: None,
            pending_gaze: None,
            stale_after_ms: config.stale_after_ms,
        }
    }

    pub fn region(&self) -> ActiveRegion {
        self.gaze.region()
    }

    /// Store a sample, replacing any earlier one of the same kind.
    pub fn on_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::HandData { landmarks } => {
                self.latest_hand = Some(HandFrame {
                    landmarks,
                    received: self.clock.now(),
                });
            }
            InboundMessage::GazeData { gaze } => self.pending_gaze = Some(gaze),
        }
    }

    /// Interpret the stored samples against `page`. Each sample is consumed by one tick.
    /// Gaze goes first so the pointer lands in the updated region.
    pub fn tick<P: Page>(&mut self, page: &mut P) -> TickReport {
        let now = self.clock.now();
        let gaze = self
            .pending_gaze
            .take()
            .map(|sample| self.gaze.update(sample, &self.mapper, now));

        let outcome = self.interpret_hand(page, now);
        TickReport { gaze, outcome }
    }

    fn interpret_hand<P: Page>(&mut self, page: &mut P, now: Timestamp) -> Option<DispatchOutcome> {
        let frame = self.latest_hand.take()?;
        let age_ms = now.millis_since(frame.received);
        if age_ms > self.stale_after_ms {
            debug!(age_ms, "hand sample stale, dropped");
            return None;
        }

        let pointer = frame
            .landmarks
            .get(INDEX_TIP)
            .map(|tip| self.mapper.map_landmark(tip, self.gaze.region(), page.viewport()));
        let input = FrameInput {
            hand: &frame.landmarks,
            pointer,
        };
        let event = self.gestures.evaluate(&input, now)?;
        Some(self.dispatcher.dispatch(page, &event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatch::fakes::*;
    use crate::dispatch::PointerPhase;
    use crate::geometry::fixtures::*;

    fn context(clock: &ManualClock) -> PageContext<ManualClock> {
        PageContext::new(&EngineConfig::default(), clock.clone())
    }

    fn page_with_target() -> FakePage {
        let mut page = FakePage::default();
        let node = page.push(None, plain());
        page.hit = Some(node);
        page
    }

    fn hand(landmarks: HandLandmarkSet) -> InboundMessage {
        InboundMessage::HandData { landmarks }
    }

    fn gaze(x: f32, y: f32) -> InboundMessage {
        InboundMessage::GazeData {
            gaze: GazeSample { x, y },
        }
    }

    #[test]
    fn idle_without_samples() {
        let clock = ManualClock::new(0);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        assert_eq!(ctx.tick(&mut page), TickReport::default());
        assert!(page.effects.is_empty());
    }

    #[test]
    fn one_hand_sample_scrolls_once() {
        let clock = ManualClock::new(1_000);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        ctx.on_message(hand(pointing_fist((0.45, 0.60), (0.45, 0.55), (0.45, 0.50))));

        let mut scrolls = 0;
        for _ in 0..22 {
            if ctx.tick(&mut page).outcome.is_some() {
                scrolls += 1;
            }
            clock.advance(16);
        }
        assert_eq!(scrolls, 1);
        assert_eq!(
            page.effects.iter().filter(|e| matches!(e, Effect::ScrollDocument(_))).count(),
            1
        );
    }

    #[test]
    fn each_new_sample_scrolls_again() {
        let clock = ManualClock::new(1_000);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        let fist = pointing_fist((0.45, 0.60), (0.45, 0.55), (0.45, 0.50));

        for _ in 0..3 {
            ctx.on_message(hand(fist.clone()));
            assert!(matches!(
                ctx.tick(&mut page).outcome,
                Some(DispatchOutcome::ScrolledDocument { .. })
            ));
            clock.advance(16);
            assert_eq!(ctx.tick(&mut page).outcome, None);
            clock.advance(84);
        }
    }

    #[test]
    fn late_tick_drops_stale_sample() {
        let clock = ManualClock::new(1_000);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        ctx.on_message(hand(pinch(0.01)));

        clock.advance(251);
        assert_eq!(ctx.tick(&mut page).outcome, None);
        assert!(page.effects.is_empty());
    }

    #[test]
    fn long_stale_window_never_clicks_twice_per_sample() {
        let clock = ManualClock::new(0);
        let config = EngineConfig {
            stale_after_ms: 2_000,
            ..EngineConfig::default()
        };
        let mut ctx = PageContext::new(&config, clock.clone());
        let mut page = page_with_target();
        ctx.on_message(hand(pinch(0.01)));

        for _ in 0..60 {
            ctx.tick(&mut page);
            clock.advance(16);
        }
        let clicks = page
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Pointer(_, PointerPhase::Click)))
            .count();
        assert_eq!(clicks, 1);
    }

    #[test]
    fn pinch_clicks_once_per_cooldown() {
        let clock = ManualClock::new(0);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        ctx.on_message(hand(pinch(0.01)));

        assert!(matches!(
            ctx.tick(&mut page).outcome,
            Some(DispatchOutcome::Clicked { .. })
        ));
        clock.advance(100);
        ctx.on_message(hand(pinch(0.01)));
        assert_eq!(ctx.tick(&mut page).outcome, None);

        clock.advance(400);
        ctx.on_message(hand(pinch(0.01)));
        assert!(matches!(
            ctx.tick(&mut page).outcome,
            Some(DispatchOutcome::Clicked { .. })
        ));

        let clicks = page
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Pointer(_, PointerPhase::Click)))
            .count();
        assert_eq!(clicks, 2);
    }

    #[test]
    fn gaze_sample_consumed_once() {
        let clock = ManualClock::new(0);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        ctx.on_message(gaze(0.5, 0.6));

        assert_eq!(ctx.tick(&mut page).gaze, Some(GazeUpdate::Anchored));
        assert_eq!(ctx.tick(&mut page).gaze, None);
    }

    #[test]
    fn gaze_move_shifts_click_point_into_new_cell() {
        let clock = ManualClock::new(0);
        let mut ctx = context(&clock);
        let mut page = page_with_target();

        ctx.on_message(gaze(0.5, 0.65));
        ctx.tick(&mut page);
        clock.advance(100);
        // Mirrored x: a smaller raw x is further right on screen.
        ctx.on_message(gaze(0.4, 0.65));
        ctx.on_message(hand(pinch(0.01)));
        let report = ctx.tick(&mut page);

        assert!(matches!(report.gaze, Some(GazeUpdate::Moved { .. })));
        assert_eq!(ctx.region(), ActiveRegion::new(1, 2));
        match report.outcome {
            Some(DispatchOutcome::Clicked { x, .. }) => assert!(x >= 800.0, "x = {}", x),
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn newer_hand_sample_replaces_older() {
        let clock = ManualClock::new(0);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        ctx.on_message(hand(pinch(0.01)));
        ctx.on_message(hand(HandLandmarkSet::new(open_hand())));
        assert_eq!(ctx.tick(&mut page).outcome, None);
    }

    #[test]
    fn truncated_hand_is_ignored() {
        let clock = ManualClock::new(0);
        let mut ctx = context(&clock);
        let mut page = page_with_target();
        ctx.on_message(hand(HandLandmarkSet::new(open_hand()[..6].to_vec())));
        assert_eq!(ctx.tick(&mut page).outcome, None);
        assert!(page.effects.is_empty());
    }
}

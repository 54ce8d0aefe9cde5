// Action dispatcher: resolves a screen point to a scroll container or click target
// and synthesizes the input. The DOM and the browser tab strip sit behind traits.
// See DESIGN.md: Action Dispatcher

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::*;

/// Computed `overflow-y` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
}

impl Overflow {
    /// Parse a computed style value. Unknown values behave like `visible`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "auto" => Overflow::Auto,
            "scroll" => Overflow::Scroll,
            "hidden" => Overflow::Hidden,
            "clip" => Overflow::Clip,
            _ => Overflow::Visible,
        }
    }

    pub fn allows_scroll(self) -> bool {
        matches!(self, Overflow::Auto | Overflow::Scroll)
    }
}

/// Vertical scroll facts of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub overflow_y: Overflow,
    pub scroll_height: i32,
    pub client_height: i32,
}

impl ScrollMetrics {
    pub fn is_scroll_container(&self) -> bool {
        self.overflow_y.allows_scroll() && self.scroll_height > self.client_height
    }
}

/// Pointer and mouse events making up one synthetic click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    PointerDown,
    MouseDown,
    PointerUp,
    MouseUp,
    Click,
}

impl PointerPhase {
    pub const CLICK_SEQUENCE: [PointerPhase; 5] = [
        PointerPhase::PointerDown,
        PointerPhase::MouseDown,
        PointerPhase::PointerUp,
        PointerPhase::MouseUp,
        PointerPhase::Click,
    ];

    pub fn event_type(self) -> &'static str {
        match self {
            PointerPhase::PointerDown => "pointerdown",
            PointerPhase::MouseDown => "mousedown",
            PointerPhase::PointerUp => "pointerup",
            PointerPhase::MouseUp => "mouseup",
            PointerPhase::Click => "click",
        }
    }

    pub fn is_pointer_event(self) -> bool {
        matches!(self, PointerPhase::PointerDown | PointerPhase::PointerUp)
    }

    /// Whether the primary button is held while this event fires.
    pub fn button_held(self) -> bool {
        matches!(self, PointerPhase::PointerDown | PointerPhase::MouseDown)
    }
}

/// Live document the page context acts on.
pub trait Page {
    type Node: Clone;

    fn viewport(&self) -> ViewportSize;

    /// Topmost element under a viewport point.
    fn element_at(&self, point: ScreenPoint) -> Option<Self::Node>;

    fn parent_of(&self, node: &Self::Node) -> Option<Self::Node>;

    fn scroll_metrics(&self, node: &Self::Node) -> ScrollMetrics;

    fn scroll_element_by(&mut self, node: &Self::Node, delta_y: f32);

    fn scroll_document_by(&mut self, delta_y: f32);

    fn dispatch_wheel(&mut self, node: &Self::Node, point: ScreenPoint, delta_y: f32);

    fn dispatch_pointer(&mut self, node: &Self::Node, phase: PointerPhase, point: ScreenPoint);
}

/// One tab of the current window, in strip order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub active: bool,
}

/// Tab strip of the current window.
pub trait TabHost {
    fn current_window_tabs(&self) -> Vec<TabInfo>;

    fn activate(&mut self, tab: TabId);

    fn active_tab(&self) -> Option<TabId> {
        self.current_window_tabs()
            .into_iter()
            .find(|t| t.active)
            .map(|t| t.id)
    }
}

/// What a dispatch did. Reported back to JS for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DispatchOutcome {
    TabActivated { tab_id: TabId },
    ScrolledElement { delta_y: f32 },
    ScrolledDocument { delta_y: f32 },
    Clicked { x: f32, y: f32 },
    NoTarget,
    /// Event belongs to another context (tab switching runs in the coordinator).
    NotHandled,
}

/// Index of the neighbouring tab, wrapping at both ends.
pub fn next_tab_index(current: usize, direction: TabDirection, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (current as i64 + direction.offset() as i64).rem_euclid(count as i64) as usize
}

/// Activate the neighbouring tab of the active one. No-op without an active tab.
pub fn switch_tab<H: TabHost>(host: &mut H, direction: TabDirection) -> DispatchOutcome {
    let tabs = host.current_window_tabs();
    let Some(current) = tabs.iter().position(|t| t.active) else {
        debug!("tab switch skipped: no active tab");
        return DispatchOutcome::NoTarget;
    };
    let target = tabs[next_tab_index(current, direction, tabs.len())].id;
    host.activate(target);
    DispatchOutcome::TabActivated { tab_id: target }
}

/// Applies page-context gesture events to a [`Page`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn new() -> Self {
        ActionDispatcher
    }

    pub fn dispatch<P: Page>(&self, page: &mut P, event: &GestureEvent) -> DispatchOutcome {
        match *event {
            GestureEvent::ScrollContinuous { delta_y, at } => self.scroll(page, delta_y, at),
            GestureEvent::PinchClick { at } => self.click(page, at),
            GestureEvent::TabSwitch { .. } => DispatchOutcome::NotHandled,
        }
    }

    /// Scroll the nearest scroll container under `point`, falling back to the document.
    /// A wheel event also goes to the element under the point for listener-driven scrollers.
    pub fn scroll<P: Page>(&self, page: &mut P, delta_y: f32, point: ScreenPoint) -> DispatchOutcome {
        let Some(hit) = page.element_at(point) else {
            page.scroll_document_by(delta_y);
            return DispatchOutcome::ScrolledDocument { delta_y };
        };

        let outcome = match self.scroll_container(page, &hit) {
            Some(container) => {
                page.scroll_element_by(&container, delta_y);
                DispatchOutcome::ScrolledElement { delta_y }
            }
            None => {
                page.scroll_document_by(delta_y);
                DispatchOutcome::ScrolledDocument { delta_y }
            }
        };
        page.dispatch_wheel(&hit, point, delta_y);
        outcome
    }

    /// Full pointer + mouse press/release + click at `point` on the topmost element.
    pub fn click<P: Page>(&self, page: &mut P, point: ScreenPoint) -> DispatchOutcome {
        let Some(target) = page.element_at(point) else {
            debug!(x = point.x, y = point.y, "click skipped: nothing under point");
            return DispatchOutcome::NoTarget;
        };
        for phase in PointerPhase::CLICK_SEQUENCE {
            page.dispatch_pointer(&target, phase, point);
        }
        DispatchOutcome::Clicked {
            x: point.x,
            y: point.y,
        }
    }

    fn scroll_container<P: Page>(&self, page: &P, start: &P::Node) -> Option<P::Node> {
        let mut node = Some(start.clone());
        while let Some(current) = node {
            if page.scroll_metrics(&current).is_scroll_container() {
                return Some(current);
            }
            node = page.parent_of(&current);
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory DOM and tab strip.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Effect {
        ScrollElement(usize, f32),
        ScrollDocument(f32),
        Wheel(usize, f32),
        Pointer(usize, PointerPhase),
    }

    #[derive(Debug, Clone)]
    pub struct FakeNode {
        pub parent: Option<usize>,
        pub metrics: ScrollMetrics,
    }

    /// Element tree with a single hit-test answer.
    #[derive(Debug, Default)]
    pub struct FakePage {
        pub nodes: Vec<FakeNode>,
        pub hit: Option<usize>,
        pub effects: Vec<Effect>,
    }

    pub fn plain() -> ScrollMetrics {
        ScrollMetrics {
            overflow_y: Overflow::Visible,
            scroll_height: 100,
            client_height: 100,
        }
    }

    impl FakePage {
        pub fn push(&mut self, parent: Option<usize>, metrics: ScrollMetrics) -> usize {
            self.nodes.push(FakeNode { parent, metrics });
            self.nodes.len() - 1
        }
    }

    impl Page for FakePage {
        type Node = usize;

        fn viewport(&self) -> ViewportSize {
            ViewportSize::new(1200.0, 900.0)
        }

        fn element_at(&self, _point: ScreenPoint) -> Option<usize> {
            self.hit
        }

        fn parent_of(&self, node: &usize) -> Option<usize> {
            self.nodes[*node].parent
        }

        fn scroll_metrics(&self, node: &usize) -> ScrollMetrics {
            self.nodes[*node].metrics
        }

        fn scroll_element_by(&mut self, node: &usize, delta_y: f32) {
            self.effects.push(Effect::ScrollElement(*node, delta_y));
        }

        fn scroll_document_by(&mut self, delta_y: f32) {
            self.effects.push(Effect::ScrollDocument(delta_y));
        }

        fn dispatch_wheel(&mut self, node: &usize, _point: ScreenPoint, delta_y: f32) {
            self.effects.push(Effect::Wheel(*node, delta_y));
        }

        fn dispatch_pointer(&mut self, node: &usize, phase: PointerPhase, _point: ScreenPoint) {
            self.effects.push(Effect::Pointer(*node, phase));
        }
    }

    #[derive(Debug, Default)]
    pub struct FakeTabs {
        pub tabs: Vec<TabInfo>,
        pub activations: Vec<TabId>,
    }

    impl FakeTabs {
        pub fn with_active(count: i32, active: i32) -> Self {
            FakeTabs {
                tabs: (0..count)
                    .map(|i| TabInfo {
                        id: TabId::new(100 + i),
                        active: i == active,
                    })
                    .collect(),
                activations: Vec::new(),
            }
        }
    }

    impl TabHost for FakeTabs {
        fn current_window_tabs(&self) -> Vec<TabInfo> {
            self.tabs.clone()
        }

        fn activate(&mut self, tab: TabId) {
            for t in &mut self.tabs {
                t.active = t.id == tab;
            }
            self.activations.push(tab);
        }
    }
}

// web-sys binding of the Page trait: hit testing, computed overflow, native scroll,
// and synthetic wheel/pointer/mouse events.

use tracing::warn;
use wasm_bindgen::JsValue;
use web_sys::{
    Document, Element, Event, MouseEvent, MouseEventInit, PointerEvent, PointerEventInit,
    WheelEvent, WheelEventInit, Window,
};

use crate::dispatch::{Overflow, Page, PointerPhase, ScrollMetrics};
use crate::error::EngineError;
use crate::types::{ScreenPoint, ViewportSize};

/// `WheelEvent.DOM_DELTA_PIXEL`
const DOM_DELTA_PIXEL: u32 = 0;

/// The document of the page this context runs in.
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn new() -> Result<Self, EngineError> {
        let window = web_sys::window().ok_or(EngineError::NoWindow)?;
        let document = window.document().ok_or(EngineError::NoWindow)?;
        Ok(DomPage { window, document })
    }

    fn fire(&self, node: &Element, event: Result<Event, JsValue>, kind: &str) {
        let result = event.and_then(|event| node.dispatch_event(&event));
        if let Err(err) = result {
            warn!(kind, ?err, "synthetic event dispatch failed");
        }
    }

    fn pointer_event(&self, phase: PointerPhase, point: ScreenPoint) -> Result<Event, JsValue> {
        let init = PointerEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_composed(true);
        init.set_view(Some(&self.window));
        init.set_client_x(point.x.round() as i32);
        init.set_client_y(point.y.round() as i32);
        init.set_button(0);
        init.set_buttons(if phase.button_held() { 1 } else { 0 });
        init.set_pointer_id(1);
        init.set_pointer_type("mouse");
        init.set_is_primary(true);
        PointerEvent::new_with_event_init_dict(phase.event_type(), &init).map(Event::from)
    }

    fn mouse_event(&self, phase: PointerPhase, point: ScreenPoint) -> Result<Event, JsValue> {
        let init = MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_composed(true);
        init.set_view(Some(&self.window));
        init.set_client_x(point.x.round() as i32);
        init.set_client_y(point.y.round() as i32);
        init.set_button(0);
        init.set_buttons(if phase.button_held() { 1 } else { 0 });
        MouseEvent::new_with_mouse_event_init_dict(phase.event_type(), &init).map(Event::from)
    }
}

fn dimension(value: Result<JsValue, JsValue>) -> f32 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}

impl Page for DomPage {
    type Node = Element;

    fn viewport(&self) -> ViewportSize {
        ViewportSize::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn element_at(&self, point: ScreenPoint) -> Option<Element> {
        self.document.element_from_point(point.x, point.y)
    }

    fn parent_of(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn scroll_metrics(&self, node: &Element) -> ScrollMetrics {
        let overflow_y = self
            .window
            .get_computed_style(node)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value("overflow-y").ok())
            .map(|value| Overflow::parse(&value))
            .unwrap_or(Overflow::Visible);
        ScrollMetrics {
            overflow_y,
            scroll_height: node.scroll_height(),
            client_height: node.client_height(),
        }
    }

    fn scroll_element_by(&mut self, node: &Element, delta_y: f32) {
        node.scroll_by_with_x_and_y(0.0, delta_y as f64);
    }

    fn scroll_document_by(&mut self, delta_y: f32) {
        self.window.scroll_by_with_x_and_y(0.0, delta_y as f64);
    }

    fn dispatch_wheel(&mut self, node: &Element, point: ScreenPoint, delta_y: f32) {
        let init = WheelEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_composed(true);
        init.set_view(Some(&self.window));
        init.set_client_x(point.x.round() as i32);
        init.set_client_y(point.y.round() as i32);
        init.set_delta_y(delta_y as f64);
        init.set_delta_mode(DOM_DELTA_PIXEL);
        let event = WheelEvent::new_with_event_init_dict("wheel", &init).map(Event::from);
        self.fire(node, event, "wheel");
    }

    fn dispatch_pointer(&mut self, node: &Element, phase: PointerPhase, point: ScreenPoint) {
        let event = if phase.is_pointer_event() {
            self.pointer_event(phase, point)
        } else {
            self.mouse_event(phase, point)
        };
        self.fire(node, event, phase.event_type());
    }
}

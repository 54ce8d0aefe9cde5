// gesture_core: hand-gesture and gaze interpretation for browser control.
// The inference page produces samples, the coordinator routes them and switches tabs,
// and each page context turns them into scrolls and clicks. JS is plumbing.

mod clock;
mod dispatch;
mod dom;
mod error;
mod gaze;
mod geometry;
mod gestures;
mod logging;
mod mapper;
mod page;
mod router;
mod types;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{
    next_tab_index, switch_tab, ActionDispatcher, DispatchOutcome, Overflow, Page, PointerPhase,
    ScrollMetrics, TabHost, TabInfo,
};
pub use dom::DomPage;
pub use error::EngineError;
pub use gaze::{GazeRegionSelector, GazeUpdate};
pub use geometry::{Finger, Reference, ScrollDirection, ScrollIntent};
pub use gestures::{
    CooldownState, Debouncer, FistScrollRecognizer, FrameInput, GestureEngine, GestureKind,
    PinchClickRecognizer, Recognizer, TabSwitchRecognizer,
};
pub use logging::{ConsoleMakeWriter, ConsoleWriter};
pub use mapper::CoordinateMapper;
pub use page::{PageContext, TickReport};
pub use router::{
    Command, CoordinatorEngine, Delivered, Delivery, InjectionFailed, Messenger, ReceiverAbsent,
    RouteOutcome, Router,
};
pub use types::*;

/// Landmark geometry helpers for callers building their own recognizers.
pub mod landmarks {
    pub use crate::geometry::*;
}

/// Install the panic hook and route `tracing` output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init(tracing::Level::INFO);
}

/// Page context interface exposed to the content script.
/// Messages are stored on arrival; `tick()` runs once per animation frame.
#[wasm_bindgen]
pub struct PageEngine {
    context: PageContext<SystemClock>,
    page: Option<DomPage>,
}

#[wasm_bindgen]
impl PageEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<PageEngine, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(to_js)?;
        Ok(PageEngine {
            context: PageContext::new(&config, SystemClock),
            page: None,
        })
    }

    /// Accept a `HAND_DATA` or `GAZE_DATA` message.
    pub fn on_message(&mut self, message_json: &str) -> Result<(), JsValue> {
        self.accept(message_json).map_err(to_js)
    }

    /// Interpret the latest samples against the document.
    /// Returns `{ gaze, outcomes }`: the gaze update (or null) and the dispatch outcomes
    /// (empty when idle).
    pub fn tick(&mut self) -> Result<String, JsValue> {
        self.run_tick().map_err(to_js)
    }

    /// Returns `{ row, col }` of the gaze-selected grid cell.
    pub fn active_region(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.context.region())
            .map_err(|e| to_js(EngineError::from(e)))
    }
}

impl PageEngine {
    fn accept(&mut self, message_json: &str) -> Result<(), EngineError> {
        let message = InboundMessage::from_json(message_json)?;
        self.context.on_message(message);
        Ok(())
    }

    fn run_tick(&mut self) -> Result<String, EngineError> {
        let page = match self.page.as_mut() {
            Some(page) => page,
            None => self.page.insert(DomPage::new()?),
        };
        tick_json(self.context.tick(page))
    }
}

#[derive(Serialize)]
struct TickJson {
    gaze: Option<GazeUpdate>,
    outcomes: Vec<DispatchOutcome>,
}

fn tick_json(report: TickReport) -> Result<String, EngineError> {
    let body = TickJson {
        gaze: report.gaze,
        outcomes: report.outcome.into_iter().collect(),
    };
    Ok(serde_json::to_string(&body)?)
}

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

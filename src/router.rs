// Cross-context router (background coordinator): executes tab switches and relays samples
// to the active tab, tracking which tabs have a live receiver.
// See DESIGN.md: Cross-Context Router

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;

use crate::clock::{Clock, SystemClock};
use crate::dispatch::{switch_tab, DispatchOutcome, TabHost, TabInfo};
use crate::error::EngineError;
use crate::gestures::{FrameInput, GestureEngine};
use crate::types::*;

/// Message reached a live receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered;

/// No receiver in the tab (navigated away, closed, or never injected).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverAbsent;

/// Receiver script could not be injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionFailed {
    pub reason: String,
}

/// Transport to page contexts.
pub trait Messenger {
    fn inject(&mut self, tab: TabId) -> Result<(), InjectionFailed>;

    fn send(&mut self, tab: TabId, message: &InboundMessage) -> Result<Delivered, ReceiverAbsent>;
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Delivery {
    Forwarded { tab_id: TabId },
    ReceiverAbsent { tab_id: TabId },
    InjectionFailed { tab_id: TabId },
    NoActiveTab,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub tab_switch: Option<DispatchOutcome>,
    pub delivery: Delivery,
}

/// Coordinator state. Owned by the background context's event loop.
pub struct Router<C: Clock> {
    clock: C,
    gestures: GestureEngine,
    present: HashSet<TabId>,
}

impl<C: Clock> Router<C> {
    pub fn new(config: &EngineConfig, clock: C) -> Self {
        Router {
            clock,
            gestures: GestureEngine::coordinator(config.gestures.clone()),
            present: HashSet::new(),
        }
    }

    pub fn is_present(&self, tab: TabId) -> bool {
        self.present.contains(&tab)
    }

    pub fn on_message<H, M>(
        &mut self,
        message: &InboundMessage,
        host: &mut H,
        messenger: &mut M,
    ) -> RouteOutcome
    where
        H: TabHost,
        M: Messenger,
    {
        let tab_switch = match message {
            InboundMessage::HandData { landmarks } => self.recognize_tab_switch(landmarks, host),
            InboundMessage::GazeData { .. } => None,
        };

        let delivery = match host.active_tab() {
            Some(tab) => self.forward(tab, message, messenger),
            None => Delivery::NoActiveTab,
        };

        RouteOutcome {
            tab_switch,
            delivery,
        }
    }

    fn recognize_tab_switch<H: TabHost>(
        &mut self,
        landmarks: &HandLandmarkSet,
        host: &mut H,
    ) -> Option<DispatchOutcome> {
        let input = FrameInput {
            hand: landmarks,
            pointer: None,
        };
        match self.gestures.evaluate(&input, self.clock.now())? {
            GestureEvent::TabSwitch { direction } => Some(switch_tab(host, direction)),
            _ => None,
        }
    }

    fn forward<M: Messenger>(
        &mut self,
        tab: TabId,
        message: &InboundMessage,
        messenger: &mut M,
    ) -> Delivery {
        if !self.ensure_receiver(tab, messenger) {
            return Delivery::InjectionFailed { tab_id: tab };
        }
        match messenger.send(tab, message) {
            Ok(Delivered) => Delivery::Forwarded { tab_id: tab },
            Err(ReceiverAbsent) => {
                debug!(tab = tab.as_i32(), "receiver absent; will re-inject on next message");
                self.mark_absent(tab);
                Delivery::ReceiverAbsent { tab_id: tab }
            }
        }
    }

    /// Inject the receiver unless the tab is already tracked. Returns whether it is present.
    pub fn ensure_receiver<M: Messenger>(&mut self, tab: TabId, messenger: &mut M) -> bool {
        if self.present.contains(&tab) {
            return true;
        }
        match messenger.inject(tab) {
            Ok(()) => {
                debug!(tab = tab.as_i32(), "receiver injected");
                self.present.insert(tab);
                true
            }
            Err(InjectionFailed { reason }) => {
                warn!(tab = tab.as_i32(), %reason, "receiver injection failed");
                self.present.remove(&tab);
                false
            }
        }
    }

    pub fn mark_absent(&mut self, tab: TabId) {
        self.present.remove(&tab);
    }

    pub fn tab_activated<M: Messenger>(&mut self, tab: TabId, messenger: &mut M) {
        self.ensure_receiver(tab, messenger);
    }

    /// Navigation started: the old receiver is gone with the old document.
    pub fn navigation_started(&mut self, tab: TabId) {
        self.mark_absent(tab);
    }

    pub fn navigation_completed<M: Messenger>(&mut self, tab: TabId, messenger: &mut M) {
        self.ensure_receiver(tab, messenger);
    }

    pub fn tab_removed(&mut self, tab: TabId) {
        self.mark_absent(tab);
    }
}

/// Command for the JS glue to execute, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Activate { tab_id: TabId },
    Inject { tab_id: TabId },
    Forward { tab_id: TabId },
}

/// Tab strip snapshot supplied by JS for one message; activations become commands.
struct SnapshotTabs<'a> {
    tabs: Vec<TabInfo>,
    commands: &'a mut Vec<Command>,
}

impl TabHost for SnapshotTabs<'_> {
    fn current_window_tabs(&self) -> Vec<TabInfo> {
        self.tabs.clone()
    }

    fn activate(&mut self, tab: TabId) {
        for t in &mut self.tabs {
            t.active = t.id == tab;
        }
        self.commands.push(Command::Activate { tab_id: tab });
    }
}

/// Records transport work as commands. Outcomes arrive later through
/// [`CoordinatorEngine::injection_result`] and [`CoordinatorEngine::delivery_failed`].
#[derive(Default)]
struct PlannedMessenger {
    commands: Vec<Command>,
}

impl Messenger for PlannedMessenger {
    fn inject(&mut self, tab: TabId) -> Result<(), InjectionFailed> {
        self.commands.push(Command::Inject { tab_id: tab });
        Ok(())
    }

    fn send(&mut self, tab: TabId, _message: &InboundMessage) -> Result<Delivered, ReceiverAbsent> {
        self.commands.push(Command::Forward { tab_id: tab });
        Ok(Delivered)
    }
}

#[derive(Debug, Deserialize)]
struct TabsSnapshot(Vec<TabInfo>);

/// Coordinator interface exposed to the background service worker.
///
/// Each call returns a JSON command plan; the worker performs the chrome API calls
/// and reports failures back.
#[wasm_bindgen]
pub struct CoordinatorEngine {
    router: Router<SystemClock>,
}

#[wasm_bindgen]
impl CoordinatorEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<CoordinatorEngine, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(to_js)?;
        Ok(CoordinatorEngine {
            router: Router::new(&config, SystemClock),
        })
    }

    /// Route one inbound message given the current window's tabs (`[{id, active}]`, strip order).
    /// Returns `[{op: "activate"|"inject"|"forward", tab_id}]`.
    pub fn on_message(&mut self, message_json: &str, tabs_json: &str) -> Result<String, JsValue> {
        self.plan(message_json, tabs_json).map_err(to_js)
    }

    /// Report the outcome of an `inject` command.
    pub fn injection_result(&mut self, tab_id: i32, ok: bool) {
        if !ok {
            warn!(tab = tab_id, "receiver injection failed");
            self.router.mark_absent(TabId::new(tab_id));
        }
    }

    /// A `forward` found no receiver in the tab.
    pub fn delivery_failed(&mut self, tab_id: i32) {
        self.router.mark_absent(TabId::new(tab_id));
    }

    /// Returns the command plan (possibly an `inject`).
    pub fn tab_activated(&mut self, tab_id: i32) -> Result<String, JsValue> {
        let mut messenger = PlannedMessenger::default();
        self.router.tab_activated(TabId::new(tab_id), &mut messenger);
        serialize_commands(&messenger.commands).map_err(to_js)
    }

    pub fn tab_loading(&mut self, tab_id: i32) {
        self.router.navigation_started(TabId::new(tab_id));
    }

    /// Returns the command plan (possibly an `inject`).
    pub fn tab_complete(&mut self, tab_id: i32) -> Result<String, JsValue> {
        let mut messenger = PlannedMessenger::default();
        self.router.navigation_completed(TabId::new(tab_id), &mut messenger);
        serialize_commands(&messenger.commands).map_err(to_js)
    }

    pub fn tab_removed(&mut self, tab_id: i32) {
        self.router.tab_removed(TabId::new(tab_id));
    }
}

impl CoordinatorEngine {
    fn plan(&mut self, message_json: &str, tabs_json: &str) -> Result<String, EngineError> {
        let message = InboundMessage::from_json(message_json)?;
        let TabsSnapshot(tabs) = serde_json::from_str(tabs_json)
            .map_err(|e| EngineError::InvalidTabs(e.to_string()))?;

        let mut activations = Vec::new();
        let mut messenger = PlannedMessenger::default();
        let outcome = {
            let mut host = SnapshotTabs {
                tabs,
                commands: &mut activations,
            };
            self.router.on_message(&message, &mut host, &mut messenger)
        };
        if let Some(switch) = outcome.tab_switch {
            info!(?switch, "tab switch planned");
        }

        activations.extend(messenger.commands);
        serialize_commands(&activations)
    }
}

fn serialize_commands(commands: &[Command]) -> Result<String, EngineError> {
    Ok(serde_json::to_string(commands)?)
}

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// Single source of "now" for cooldowns, settle windows, and staleness checks.

use std::cell::Cell;
use std::rc::Rc;

use crate::types::Timestamp;

/// Wall-clock capability injected into every stateful context.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Browser wall clock (`Date.now()`) on wasm, system time elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(js_sys::Date::now() as u64)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now(&self) -> Timestamp {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp::from_millis(ms)
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now_ms: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.set(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now_ms.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now().as_millis(), 150);
        clock.set(10);
        assert_eq!(handle.now().as_millis(), 10);
    }

    #[test]
    fn system_clock_is_past_epoch() {
        assert!(SystemClock.now().as_millis() > 0);
    }
}

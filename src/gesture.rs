// SPDX-License-Identifier: GPL-3.0-only

//! Long-press gesture detection
//!
//! Reactive rather than timer-driven: the detector only looks at the
//! press/release timestamps it is handed. A `suspend()`ed detector
//! discards the in-flight measurement on release, which vetoes
//! accidental long-presses while a modal surface (the on-screen
//! keyboard) is open.

use crate::constants::LONG_PRESS_THRESHOLD_MS;
use tracing::debug;

/// Callback invoked with the press duration in milliseconds
pub type LongPressCallback = Box<dyn FnMut(u64)>;

/// Detects press-hold-release gestures exceeding a duration threshold
pub struct LongPressGesture {
    press_at_ms: Option<u64>,
    suspended: bool,
    threshold_ms: u64,
    callback: LongPressCallback,
}

impl LongPressGesture {
    /// Create a detector with the default 1000 ms threshold
    pub fn new(callback: LongPressCallback) -> Self {
        Self::with_threshold(LONG_PRESS_THRESHOLD_MS, callback)
    }

    pub fn with_threshold(threshold_ms: u64, callback: LongPressCallback) -> Self {
        Self {
            press_at_ms: None,
            suspended: false,
            threshold_ms,
            callback,
        }
    }

    /// Record a press event
    pub fn press(&mut self, timestamp_ms: u64) {
        self.press_at_ms = Some(timestamp_ms);
    }

    /// Record a release event, firing the callback on a long press
    pub fn release(&mut self, timestamp_ms: u64) {
        if self.suspended {
            // a modal surface is open: discard this measurement
            debug!("Long-press suspended, discarding measurement");
            self.press_at_ms = None;
            return;
        }

        let Some(pressed_at) = self.press_at_ms.take() else {
            return;
        };

        let duration = timestamp_ms.saturating_sub(pressed_at);
        if duration > self.threshold_ms {
            debug!(duration_ms = duration, "Long press detected");
            (self.callback)(duration);
        }
    }

    /// Veto long-press detection until [`activate`](Self::activate)
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Re-enable long-press detection
    pub fn activate(&mut self) {
        self.suspended = false;
    }
}

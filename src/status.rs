// SPDX-License-Identifier: GPL-3.0-only

//! On-screen status line
//!
//! The appliance has no normal exit path, so failures are surfaced as a
//! mutable status string rendered by the display layer rather than as
//! process exit codes.

use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the status text shown on screen
#[derive(Clone, Default)]
pub struct StatusLine(Arc<Mutex<String>>);

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status text
    pub fn set(&self, text: &str) {
        let mut status = self.lock();
        status.clear();
        status.push_str(text);
    }

    /// Clear the status text (the all-good state)
    pub fn clear(&self) {
        self.set("");
    }

    /// Current status text
    pub fn get(&self) -> String {
        self.lock().clone()
    }

    // a poisoned lock still holds valid status text
    fn lock(&self) -> MutexGuard<'_, String> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let status = StatusLine::new();
        assert_eq!(status.get(), "");

        status.set("Uploading image");
        assert_eq!(status.get(), "Uploading image");

        status.clear();
        assert_eq!(status.get(), "");
    }

    #[test]
    fn test_clones_share_state() {
        let status = StatusLine::new();
        let other = status.clone();
        status.set("Snap failed :(");
        assert_eq!(other.get(), "Snap failed :(");
    }
}

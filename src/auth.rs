// SPDX-License-Identifier: GPL-3.0-only

//! Credential refresh loop
//!
//! Keeps the cloud signed-in state fresh on its own timer chain,
//! independent of capture activity. The loop never stops on failure;
//! unconditional periodic retry is the only retry policy.

use crate::hardware::CloudService;
use chrono::{DateTime, Local};
use tracing::{debug, error};

/// Signed-in state read by the session and the router
#[derive(Debug, Clone, Default)]
pub struct CredentialState {
    pub signed_in: bool,
    pub last_refresh_at: Option<DateTime<Local>>,
}

/// Periodic credential maintenance
pub struct CredentialRefreshLoop {
    /// False when neither upload nor email is enabled; the auth
    /// collaborator is then never called
    enabled: bool,
    state: CredentialState,
}

impl CredentialRefreshLoop {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            state: CredentialState::default(),
        }
    }

    /// One refresh attempt; the caller re-arms the timer regardless of
    /// the outcome
    pub fn tick(&mut self, cloud: &mut dyn CloudService) {
        if !self.enabled {
            // no cloud feature wants credentials
            return;
        }

        self.state.last_refresh_at = Some(Local::now());
        if cloud.refresh() {
            self.state.signed_in = true;
            debug!("Credentials refreshed");
        } else {
            self.state.signed_in = false;
            error!("Credential refresh failed");
        }
    }

    pub fn signed_in(&self) -> bool {
        self.state.signed_in
    }

    pub fn state(&self) -> &CredentialState {
        &self.state
    }
}

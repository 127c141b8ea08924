// SPDX-License-Identifier: GPL-3.0-only

//! Collaborator interfaces for the kiosk hardware and services
//!
//! The pipeline only ever sees these traits; the concrete implementation
//! (GPIO buttons, a real camera stack, an OAuth-backed photo service) is
//! chosen once at process composition time. The [`fake`] module provides
//! the implementations used on development machines and in tests.

pub mod fake;

use crate::errors::CameraError;
use std::path::Path;

/// Trigger codes reported by the input collaborator, one per poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerCode {
    /// Nothing pressed
    #[default]
    None,
    /// Start a single-shot session
    Single,
    /// Start a collage session
    Collage,
}

/// Opaque handle to an installed preview overlay
pub type OverlayHandle = u32;

/// Trigger input source (GPIO buttons, on-screen buttons, keyboard)
pub trait TriggerInput {
    /// Whether physical buttons are attached (drives on-screen fallback)
    fn has_buttons(&self) -> bool;

    /// Read and consume the current trigger state
    fn state(&mut self) -> TriggerCode;
}

/// Camera device collaborator
pub trait Camera {
    fn set_resolution(&mut self, width: u32, height: u32);

    fn start_preview(&mut self);

    fn stop_preview(&mut self);

    /// Capture one shot into `path`
    fn capture(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Install an RGBA overlay on the live preview
    fn add_overlay(&mut self, rgba: &[u8], size: (u32, u32)) -> Result<OverlayHandle, CameraError>;

    fn remove_overlay(&mut self, handle: OverlayHandle);

    /// Drive the camera LED; callers treat failures as cosmetic
    fn set_led(&mut self, on: bool) -> Result<(), CameraError>;

    /// Annotate the live preview with text; cosmetic, like the LED
    fn set_annotation(&mut self, text: &str) -> Result<(), CameraError>;

    /// Select a builtin image effect ("none" resets)
    fn set_effect(&mut self, effect: &str) -> Result<(), CameraError>;
}

/// Cloud photo/mail service collaborator (token handling happens behind it)
pub trait CloudService {
    /// Renew credentials; false means signed-out until the next attempt
    fn refresh(&mut self) -> bool;

    /// Upload a picture to the configured album
    fn upload_picture(
        &mut self,
        file: &Path,
        album_id: Option<&str>,
        title: &str,
        caption: &str,
    ) -> Result<(), String>;

    /// Send a picture by email; Ok(false) is a soft delivery failure
    fn send_message(
        &mut self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<bool, String>;
}

/// Live result preview (the kiosk's main image surface)
pub trait PreviewScreen {
    fn show(&mut self, path: &Path);

    fn clear(&mut self);
}

/// Print spooler collaborator; fire-and-forget from the pipeline's side
pub trait Printer {
    fn list_printers(&self) -> Vec<String>;

    fn print_file(&mut self, printer: &str, file: &Path, title: &str) -> Result<(), String>;
}

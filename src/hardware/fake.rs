// SPDX-License-Identifier: GPL-3.0-only

//! Fake collaborator implementations
//!
//! Used on development machines without kiosk hardware and by the test
//! suite. The fake camera produces real JPEG files so the composition
//! and archival stages run unmodified.

use super::{Camera, CloudService, OverlayHandle, PreviewScreen, Printer, TriggerCode, TriggerInput};
use crate::errors::CameraError;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Scripted trigger input: pops one code per poll, then reports None
#[derive(Default)]
pub struct FakeButtons {
    script: VecDeque<TriggerCode>,
    has_buttons: bool,
}

impl FakeButtons {
    pub fn new(has_buttons: bool) -> Self {
        Self {
            script: VecDeque::new(),
            has_buttons,
        }
    }

    /// Queue a trigger to be reported on a later poll
    pub fn push(&mut self, code: TriggerCode) {
        self.script.push_back(code);
    }
}

impl TriggerInput for FakeButtons {
    fn has_buttons(&self) -> bool {
        self.has_buttons
    }

    fn state(&mut self) -> TriggerCode {
        self.script.pop_front().unwrap_or(TriggerCode::None)
    }
}

/// Fake camera writing solid-color JPEG shots at the configured resolution
pub struct FakeCamera {
    resolution: (u32, u32),
    preview_active: bool,
    led: bool,
    effect: String,
    next_overlay: OverlayHandle,
    /// When set, capture() reports success without producing a file
    pub drop_shots: bool,
    /// Every path handed to capture(), in order
    pub captured: Vec<PathBuf>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            resolution: (640, 480),
            preview_active: false,
            led: false,
            effect: "none".to_string(),
            next_overlay: 0,
            drop_shots: false,
            captured: Vec::new(),
        }
    }

    pub fn preview_active(&self) -> bool {
        self.preview_active
    }

    pub fn effect(&self) -> &str {
        &self.effect
    }
}

impl Default for FakeCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for FakeCamera {
    fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = (width, height);
    }

    fn start_preview(&mut self) {
        self.preview_active = true;
    }

    fn stop_preview(&mut self) {
        self.preview_active = false;
    }

    fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        self.captured.push(path.to_path_buf());
        if self.drop_shots {
            debug!(path = %path.display(), "Fake camera dropping shot");
            return Ok(());
        }

        // Shade varies per shot so collage quadrants are distinguishable
        let shade = ((self.captured.len() * 40) % 200 + 40) as u8;
        let (w, h) = self.resolution;
        let img = RgbImage::from_pixel(w, h, Rgb([shade, shade, 200]));
        img.save(path)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        debug!(path = %path.display(), width = w, height = h, "Fake shot written");
        Ok(())
    }

    fn add_overlay(&mut self, _rgba: &[u8], _size: (u32, u32)) -> Result<OverlayHandle, CameraError> {
        self.next_overlay += 1;
        Ok(self.next_overlay)
    }

    fn remove_overlay(&mut self, _handle: OverlayHandle) {}

    fn set_led(&mut self, on: bool) -> Result<(), CameraError> {
        self.led = on;
        Ok(())
    }

    fn set_annotation(&mut self, _text: &str) -> Result<(), CameraError> {
        Ok(())
    }

    fn set_effect(&mut self, effect: &str) -> Result<(), CameraError> {
        self.effect = effect.to_string();
        Ok(())
    }
}

/// Fake cloud service with scriptable outcomes
pub struct FakeCloud {
    pub refresh_ok: bool,
    pub upload_ok: bool,
    pub send_ok: bool,
    pub refresh_calls: u32,
    /// (file, title) per accepted upload
    pub uploads: Vec<(PathBuf, String)>,
    /// (recipient, attachment) per send attempt
    pub sent: Vec<(String, PathBuf)>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            refresh_ok: true,
            upload_ok: true,
            send_ok: true,
            refresh_calls: 0,
            uploads: Vec::new(),
            sent: Vec::new(),
        }
    }
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudService for FakeCloud {
    fn refresh(&mut self) -> bool {
        self.refresh_calls += 1;
        self.refresh_ok
    }

    fn upload_picture(
        &mut self,
        file: &Path,
        _album_id: Option<&str>,
        title: &str,
        _caption: &str,
    ) -> Result<(), String> {
        if !self.upload_ok {
            return Err("upload rejected".to_string());
        }
        self.uploads.push((file.to_path_buf(), title.to_string()));
        Ok(())
    }

    fn send_message(
        &mut self,
        to: &str,
        _subject: &str,
        _body: &str,
        attachment: &Path,
    ) -> Result<bool, String> {
        self.sent.push((to.to_string(), attachment.to_path_buf()));
        Ok(self.send_ok)
    }
}

/// Preview surface that only remembers what it was last asked to show
#[derive(Default)]
pub struct FakePreview {
    pub shown: Option<PathBuf>,
}

impl PreviewScreen for FakePreview {
    fn show(&mut self, path: &Path) {
        self.shown = Some(path.to_path_buf());
    }

    fn clear(&mut self) {
        self.shown = None;
    }
}

/// Printer that accepts every job and logs it
#[derive(Default)]
pub struct FakePrinter {
    pub jobs: Vec<(String, PathBuf)>,
}

impl Printer for FakePrinter {
    fn list_printers(&self) -> Vec<String> {
        vec!["fake-printer".to_string()]
    }

    fn print_file(&mut self, printer: &str, file: &Path, title: &str) -> Result<(), String> {
        info!(printer, file = %file.display(), title, "Fake print job accepted");
        self.jobs.push((printer.to_string(), file.to_path_buf()));
        Ok(())
    }
}

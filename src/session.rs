// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! One session drives a single trigger end to end:
//! `Idle -> CountingDown -> Capturing -> [Composing] -> Persisting ->
//! {Done | Failed}`, strictly sequential. The countdown sleeps and the
//! camera/upload calls are synchronous and block the appliance's one
//! thread for their duration; the single-flight guard in the scheduler
//! keeps a second session from ever starting in the meantime.

use crate::collage;
use crate::config::Config;
use crate::constants::{
    COLLAGE_SNAP_SIZE, COUNTDOWN_TICK, FILENAME_TIMESTAMP_FORMAT, JPEG_MIME, SINGLE_SNAP_SIZE,
    TITLE_TIMESTAMP_FORMAT,
};
use crate::errors::CaptureError;
use crate::hardware::{Camera, CloudService, OverlayHandle, PreviewScreen};
use crate::persist::PersistenceRouter;
use crate::status::StatusLine;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Capture mode selected by the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// One full-resolution shot
    Single,
    /// `shots` half-resolution shots composed onto a 2x2 grid
    Collage { shots: u32 },
}

impl CaptureMode {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureMode::Single => "single",
            CaptureMode::Collage { .. } => "collage",
        }
    }

    /// Capture resolution for each shot of this mode
    pub fn snap_size(&self) -> (u32, u32) {
        match self {
            CaptureMode::Single => SINGLE_SNAP_SIZE,
            CaptureMode::Collage { .. } => COLLAGE_SNAP_SIZE,
        }
    }

    pub fn shot_count(&self) -> u32 {
        match self {
            CaptureMode::Single => 1,
            CaptureMode::Collage { shots } => (*shots).max(1),
        }
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CountingDown,
    Capturing,
    Composing,
    Persisting,
    Done,
    Failed,
}

/// Collaborators a session borrows from the scheduler for one run
pub struct SessionContext<'a> {
    pub camera: &'a mut dyn Camera,
    pub cloud: &'a mut dyn CloudService,
    pub preview: &'a mut dyn PreviewScreen,
    pub router: &'a PersistenceRouter,
    pub status: &'a StatusLine,
    pub config: &'a Config,
    pub signed_in: bool,
    /// Selected builtin image effect, "none" when inactive
    pub effect: &'a str,
}

/// One end-to-end run of countdown, capture, composition and fan-out
pub struct CaptureSession {
    mode: CaptureMode,
    state: SessionState,
    timestamp: DateTime<Local>,
    shot_files: Vec<PathBuf>,
    output_file: Option<PathBuf>,
    mime_type: &'static str,
    picture_taken: bool,
    picture_saved: bool,
    picture_uploaded: bool,
}

impl CaptureSession {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            timestamp: Local::now(),
            shot_files: Vec::new(),
            output_file: None,
            mime_type: JPEG_MIME,
            picture_taken: false,
            picture_saved: false,
            picture_uploaded: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Final location of the picture, once one exists
    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Human-readable title used for uploads and prints
    pub fn title(&self) -> String {
        self.timestamp.format(TITLE_TIMESTAMP_FORMAT).to_string()
    }

    pub fn picture_taken(&self) -> bool {
        self.picture_taken
    }

    pub fn picture_saved(&self) -> bool {
        self.picture_saved
    }

    pub fn picture_uploaded(&self) -> bool {
        self.picture_uploaded
    }

    /// Drive the session to a terminal state
    pub fn run(&mut self, ctx: &mut SessionContext) -> SessionState {
        info!(mode = self.mode.name(), "Snapping photo");
        ctx.status.clear();

        match self.produce_output(ctx) {
            Ok(output) => self.persist(ctx, &output),
            Err(e) => {
                error!(error = %e, "Error during snapshot");
                ctx.status.set("Snap failed :(");
                self.state = SessionState::Failed;
            }
        }

        // Strongest guarantee the pipeline makes: a produced picture
        // must land somewhere. Overrides any earlier outcome.
        if self.picture_taken && !self.picture_saved && !self.picture_uploaded {
            error!("Picture was taken but not saved or uploaded");
            ctx.status.set("ERROR: Picture was not saved!");
            self.state = SessionState::Failed;
        } else if self.state != SessionState::Failed {
            self.state = SessionState::Done;
        }
        self.state
    }

    /// Countdown, capture and (for collages) composition; returns the
    /// produced output file
    fn produce_output(&mut self, ctx: &mut SessionContext) -> Result<PathBuf, CaptureError> {
        let work_dir = ctx.config.work_dir.clone();
        std::fs::create_dir_all(&work_dir)
            .map_err(|e| CaptureError::Workspace(format!("{}: {}", work_dir.display(), e)))?;

        if ctx.config.enable_effects && ctx.effect != "none" {
            // cosmetic: a refused effect must not abort the session
            if let Err(e) = ctx.camera.set_effect(ctx.effect) {
                error!(effect = ctx.effect, error = %e, "Error setting image effect");
            }
        }

        let (width, height) = self.mode.snap_size();
        ctx.camera.set_resolution(width, height);
        ctx.camera.start_preview();

        let stamp = self.timestamp.format(FILENAME_TIMESTAMP_FORMAT);
        let output = work_dir.join(format!("{}.jpg", stamp));

        let result = match self.mode {
            CaptureMode::Single => {
                self.countdown(ctx);
                self.state = SessionState::Capturing;
                ctx.camera.capture(&output)?;
                self.check_shot(&output)?;
                Ok(())
            }
            CaptureMode::Collage { .. } => {
                let shots = self.mode.shot_count();
                for index in 1..=shots {
                    self.countdown(ctx);
                    self.state = SessionState::Capturing;
                    let shot = work_dir.join(format!("{}_shot{}.jpg", stamp, index));
                    ctx.camera.capture(&shot)?;
                    self.check_shot(&shot)?;
                }
                self.compose(ctx, &output)
            }
        };
        ctx.camera.stop_preview();

        result.map(|_| output)
    }

    /// Assemble the collage from the captured shots
    fn compose(&mut self, ctx: &mut SessionContext, output: &Path) -> Result<(), CaptureError> {
        self.state = SessionState::Composing;
        ctx.status.set("Assembling collage");
        debug!("Assembling collage");

        collage::compose_files(
            &self.shot_files,
            self.mode.snap_size(),
            ctx.config.collage_foreground.as_deref(),
            output,
        )?;

        ctx.status.clear();
        Ok(())
    }

    /// Verify the shot landed on disk; records the first success
    fn check_shot(&mut self, shot: &Path) -> Result<(), CaptureError> {
        if !shot.exists() {
            return Err(CaptureError::SnapshotMissing(shot.display().to_string()));
        }
        self.shot_files.push(shot.to_path_buf());
        self.picture_taken = true;
        Ok(())
    }

    /// Pre-capture countdown: one overlay image (or text annotation)
    /// per remaining second, LED toggled on each update. Everything in
    /// here is cosmetic; failures are logged and swallowed.
    fn countdown(&mut self, ctx: &mut SessionContext) {
        self.state = SessionState::CountingDown;
        let seconds = ctx.config.countdown_seconds;
        let mut led_on = false;

        for elapsed in 0..seconds {
            let remaining = seconds - elapsed;
            let overlay = self.show_countdown_step(ctx, remaining);

            led_on = !led_on;
            if let Err(e) = ctx.camera.set_led(led_on) {
                debug!(error = %e, "Countdown LED unavailable");
            }

            std::thread::sleep(COUNTDOWN_TICK);

            if let Some(handle) = overlay {
                ctx.camera.remove_overlay(handle);
            }
        }

        if let Err(e) = ctx.camera.set_led(false) {
            debug!(error = %e, "Countdown LED unavailable");
        }
        let _ = ctx.camera.set_annotation("");
    }

    /// Install the overlay for `remaining` seconds left; indexes past
    /// the configured list reuse the last image, an empty list falls
    /// back to a text annotation
    fn show_countdown_step(
        &self,
        ctx: &mut SessionContext,
        remaining: u32,
    ) -> Option<OverlayHandle> {
        let overlays = &ctx.config.countdown_overlays;
        if overlays.is_empty() {
            let _ = ctx.camera.set_annotation(&format!("  {}  ", remaining));
            return None;
        }

        let index = ((remaining - 1) as usize).min(overlays.len() - 1);
        let path = &overlays[index];
        let image = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Countdown overlay unreadable");
                let _ = ctx.camera.set_annotation(&format!("  {}  ", remaining));
                return None;
            }
        };

        let size = image.dimensions();
        match ctx.camera.add_overlay(image.as_raw(), size) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Cannot install countdown overlay");
                None
            }
        }
    }

    /// Fan the finished picture out: preview, cloud, archive
    fn persist(&mut self, ctx: &mut SessionContext, output: &Path) {
        self.state = SessionState::Persisting;
        self.output_file = Some(output.to_path_buf());

        // 1. show the result immediately
        debug!(path = %output.display(), "Displaying image");
        ctx.preview.show(output);

        // 2. upload
        if ctx.config.enable_upload && ctx.signed_in {
            ctx.status.set("Uploading image");
            info!("Uploading image");
            self.picture_uploaded = ctx.router.upload(ctx.cloud, output, &self.title());
            if self.picture_uploaded {
                ctx.status.clear();
            } else {
                ctx.status.set("Error uploading image :(");
            }
        }

        // 3. archive
        if ctx.config.local_archive {
            info!(title = %self.title(), "Archiving image");
            match ctx.router.archive_locally(output) {
                Ok(dest) => {
                    self.output_file = Some(dest);
                    self.picture_saved = true;
                }
                Err(e) => {
                    error!(error = %e, "Image couldn't be saved");
                    ctx.status.set("Saving failed :(");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parameters() {
        assert_eq!(CaptureMode::Single.shot_count(), 1);
        assert_eq!(CaptureMode::Single.snap_size(), SINGLE_SNAP_SIZE);

        let collage = CaptureMode::Collage { shots: 3 };
        assert_eq!(collage.shot_count(), 3);
        assert_eq!(collage.snap_size(), COLLAGE_SNAP_SIZE);

        // a zero-shot collage is clamped rather than looping forever
        assert_eq!(CaptureMode::Collage { shots: 0 }.shot_count(), 1);
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = CaptureSession::new(CaptureMode::Single);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.picture_taken());
        assert!(session.output_file().is_none());
        assert_eq!(session.mime_type(), JPEG_MIME);
    }
}

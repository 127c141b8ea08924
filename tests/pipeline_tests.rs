// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests for the capture-to-delivery pipeline
//!
//! These drive a full CaptureSession against the fake collaborators,
//! the way the scheduler does at runtime.

use image::{GenericImageView, Rgba, RgbaImage};
use photobooth::config::Config;
use photobooth::constants::{COLLAGE_SNAP_SIZE, SINGLE_SNAP_SIZE};
use photobooth::hardware::fake::{FakeCamera, FakeCloud, FakePreview};
use photobooth::persist::PersistenceRouter;
use photobooth::session::{CaptureMode, CaptureSession, SessionContext, SessionState};
use photobooth::status::StatusLine;
use std::path::Path;

struct Fixture {
    config: Config,
    camera: FakeCamera,
    cloud: FakeCloud,
    preview: FakePreview,
    status: StatusLine,
    signed_in: bool,
}

impl Fixture {
    fn new(dir: &Path) -> Self {
        let mut config = Config::default();
        config.countdown_seconds = 0;
        config.enable_upload = false;
        config.enable_email = false;
        config.work_dir = dir.join("work");
        config.archive_dir = dir.join("archive");
        std::fs::create_dir_all(&config.archive_dir).unwrap();

        Self {
            config,
            camera: FakeCamera::new(),
            cloud: FakeCloud::new(),
            preview: FakePreview::default(),
            status: StatusLine::new(),
            signed_in: false,
        }
    }

    fn run(&mut self, mode: CaptureMode) -> CaptureSession {
        let router = PersistenceRouter::from_config(&self.config);
        let mut session = CaptureSession::new(mode);
        let mut ctx = SessionContext {
            camera: &mut self.camera,
            cloud: &mut self.cloud,
            preview: &mut self.preview,
            router: &router,
            status: &self.status,
            config: &self.config,
            signed_in: self.signed_in,
            effect: "none",
        };
        session.run(&mut ctx);
        session
    }
}

fn archive_entries(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut entries: Vec<_> = std::fs::read_dir(dir.join("archive"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    entries.sort();
    entries
}

// Scenario: single trigger, valid shot, archiving on, upload off
#[test]
fn test_single_session_archives_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());
    fx.config.countdown_seconds = 1;

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Done);
    assert!(session.picture_taken());
    assert!(session.picture_saved());
    assert!(!session.picture_uploaded());
    assert_eq!(fx.status.get(), "");

    // exactly one archived picture named by the capture timestamp
    let archived = archive_entries(dir.path());
    assert_eq!(archived.len(), 1);
    let name = archived[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with(".jpg"));
    assert_eq!(name.trim_end_matches(".jpg").len(), "20260806_120000".len());

    // the session's output file tracks the final location
    assert_eq!(session.output_file().unwrap(), archived[0].as_path());
    // the work file was moved, not copied
    assert!(std::fs::read_dir(dir.path().join("work")).unwrap().next().is_none());

    // the preview showed the produced picture
    assert!(fx.preview.shown.is_some());
    // the shot was taken at the single-shot resolution
    let shot = image::open(&archived[0]).unwrap();
    assert_eq!((shot.width(), shot.height()), SINGLE_SNAP_SIZE);
}

// Scenario: 4-shot collage with a foreground cover
#[test]
fn test_collage_session_composes_opaque_double_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());

    // semi-transparent cover, deliberately not at canvas size
    let cover_path = dir.path().join("cover.png");
    RgbaImage::from_pixel(64, 48, Rgba([255, 255, 255, 64]))
        .save(&cover_path)
        .unwrap();
    fx.config.collage_foreground = Some(cover_path);

    let session = fx.run(CaptureMode::Collage { shots: 4 });

    assert_eq!(session.state(), SessionState::Done);
    let archived = archive_entries(dir.path());
    assert_eq!(archived.len(), 1);

    let out = image::open(&archived[0]).unwrap();
    let (w, h) = COLLAGE_SNAP_SIZE;
    assert_eq!((out.width(), out.height()), (w * 2, h * 2));
    // flattened to an opaque 3-channel image
    assert_eq!(out.color(), image::ColorType::Rgb8);
}

// A 3-shot collage leaves the fourth quadrant blank but still completes
#[test]
fn test_three_shot_collage_completes() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());

    let session = fx.run(CaptureMode::Collage { shots: 3 });

    assert_eq!(session.state(), SessionState::Done);
    let archived = archive_entries(dir.path());
    let out = image::open(&archived[0]).unwrap();
    let (w, h) = COLLAGE_SNAP_SIZE;
    assert_eq!((out.width(), out.height()), (w * 2, h * 2));
    // the blank quadrant flattens to black
    let rgb = out.to_rgb8();
    assert_eq!(rgb.get_pixel(w + w / 2, h + h / 2).0, [0, 0, 0]);
}

// A camera that produces no file aborts before compose/persist
#[test]
fn test_missing_snapshot_fails_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());
    fx.camera.drop_shots = true;

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Failed);
    assert!(!session.picture_taken());
    assert_eq!(fx.status.get(), "Snap failed :(");
    // nothing was persisted or previewed
    assert!(archive_entries(dir.path()).is_empty());
    assert!(fx.preview.shown.is_none());
    assert!(fx.cloud.uploads.is_empty());
}

// Strongest pipeline guarantee: a taken picture that lands nowhere is a
// critical failure, on every path reaching the persist step
#[test]
fn test_taken_but_unsaved_picture_is_critical_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());

    // all destinations disabled
    fx.config.local_archive = false;

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.picture_taken());
    assert!(!session.picture_saved());
    assert!(!session.picture_uploaded());
    assert_eq!(fx.status.get(), "ERROR: Picture was not saved!");
}

#[test]
fn test_archive_dir_missing_is_critical_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());
    std::fs::remove_dir(dir.path().join("archive")).unwrap();

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.picture_taken());
    assert_eq!(fx.status.get(), "ERROR: Picture was not saved!");
}

// Upload failure alone is non-fatal as long as the archive succeeds
#[test]
fn test_upload_failure_degrades_to_saved_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());
    fx.config.enable_upload = true;
    fx.signed_in = true;
    fx.cloud.upload_ok = false;

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Done);
    assert!(session.picture_saved());
    assert!(!session.picture_uploaded());
    // the failure stays visible as a transient status
    assert_eq!(fx.status.get(), "Error uploading image :(");
}

// An upload alone satisfies the delivery guarantee
#[test]
fn test_upload_only_session_completes() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());
    fx.config.enable_upload = true;
    fx.config.local_archive = false;
    fx.signed_in = true;

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Done);
    assert!(!session.picture_saved());
    assert!(session.picture_uploaded());
    assert_eq!(fx.cloud.uploads.len(), 1);
    // title is the human-readable capture timestamp
    assert_eq!(fx.cloud.uploads[0].1, session.title());
}

// Signed-out kiosks never try to upload
#[test]
fn test_signed_out_session_skips_upload() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = Fixture::new(dir.path());
    fx.config.enable_upload = true;
    fx.signed_in = false;

    let session = fx.run(CaptureMode::Single);

    assert_eq!(session.state(), SessionState::Done);
    assert!(session.picture_saved());
    assert!(!session.picture_uploaded());
    assert!(fx.cloud.uploads.is_empty());
}

// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk configuration
//!
//! Options are read once at startup from a JSON file and consumed
//! read-only by the pipeline. Unknown keys are ignored; missing keys
//! fall back to the defaults below.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recognized configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enable the "send email" feature
    pub enable_email: bool,
    /// Enable uploading to the cloud photo album
    pub enable_upload: bool,
    /// Enable the printer feature
    pub enable_print: bool,
    /// Poll GPIO buttons instead of on-screen triggers only
    pub enable_hardware_buttons: bool,
    /// Enable selectable camera image effects
    pub enable_effects: bool,
    /// Start the appliance full screen
    pub full_screen: bool,
    /// Archive pictures locally after each session
    pub local_archive: bool,
    /// Directory receiving archived pictures
    pub archive_dir: PathBuf,
    /// Also copy each picture to every writable removable volume
    pub archive_to_all_removable_drives: bool,
    /// Target album for cloud uploads (None = service default)
    pub album_id: Option<String>,
    /// Subject line of outgoing emails
    pub email_subject: String,
    /// Body of outgoing emails
    pub email_body: String,
    /// Caption prefix for uploaded pictures
    pub photo_caption: String,
    /// Printer receiving print jobs (None = first installed)
    pub selected_printer: Option<String>,
    /// Pre-capture countdown in seconds, restarted before every shot
    pub countdown_seconds: u32,
    /// Number of shots composed into a collage (3 or 4)
    pub collage_shots: u32,
    /// Trigger input polling period (ms)
    pub poll_period_ms: u64,
    /// Credential refresh period (ms)
    pub oauth_refresh_period_ms: u64,
    /// Append one audit line per outgoing email
    pub enable_email_logging: bool,
    /// Audit log path for outgoing emails
    pub audit_log_file: PathBuf,
    /// Directory where shots are captured before archiving
    pub work_dir: PathBuf,
    /// Root under which removable volumes are mounted
    pub media_root: PathBuf,
    /// Countdown overlay images, last-second image first
    pub countdown_overlays: Vec<PathBuf>,
    /// Decorative frame composited on top of the collage
    pub collage_foreground: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_email: true,
            enable_upload: true,
            enable_print: false,
            enable_hardware_buttons: false,
            enable_effects: false,
            full_screen: false,
            local_archive: true,
            archive_dir: default_archive_dir(),
            archive_to_all_removable_drives: false,
            album_id: None,
            email_subject: "Your photobooth picture".to_string(),
            email_body: "Thank you for being part of this celebration!".to_string(),
            photo_caption: String::new(),
            selected_printer: None,
            countdown_seconds: constants::COUNTDOWN_SECONDS,
            collage_shots: constants::COLLAGE_SHOTS,
            poll_period_ms: constants::HARDWARE_POLL_PERIOD_MS,
            oauth_refresh_period_ms: constants::OAUTH2_REFRESH_PERIOD_MS,
            enable_email_logging: false,
            audit_log_file: PathBuf::from(constants::EMAILS_LOG_FILE),
            work_dir: std::env::temp_dir().join("photobooth"),
            media_root: PathBuf::from(constants::DEFAULT_MEDIA_ROOT),
            countdown_overlays: Vec::new(),
            collage_foreground: None,
        }
    }
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("cannot parse {}: {}", path.display(), e))
    }

    /// Write the configuration back as pretty-printed JSON
    pub fn store(&self, path: &Path) -> Result<(), String> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("cannot serialize configuration: {}", e))?;
        std::fs::write(path, contents)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))
    }

    /// Whether any cloud service (upload or email) is in use
    pub fn cloud_enabled(&self) -> bool {
        self.enable_upload || self.enable_email
    }
}

/// Default local archive location: the pictures directory, or the home
/// directory when the system has none
fn default_archive_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(constants::ARCHIVE_FOLDER)
}

// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Polling interval for trigger input (hardware buttons, on-screen events)
pub const HARDWARE_POLL_PERIOD_MS: u64 = 100;

/// Interval between two credential refresh attempts
pub const OAUTH2_REFRESH_PERIOD_MS: u64 = 1_800_000;

/// Default pre-capture countdown, in seconds
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Delay between two countdown updates
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Snap resolution for a single shot (integer division of the sensor's native mode)
pub const SINGLE_SNAP_SIZE: (u32, u32) = (1640, 1232);

/// Snap resolution for each quadrant of the 2x2 collage
pub const COLLAGE_SNAP_SIZE: (u32, u32) = (820, 616);

/// Default number of shots composed into a collage (3 leaves one quadrant blank)
pub const COLLAGE_SHOTS: u32 = 4;

/// Folder name appended to the pictures directory for the local archive
pub const ARCHIVE_FOLDER: &str = "Photobooth";

/// Root under which removable volumes are mounted
pub const DEFAULT_MEDIA_ROOT: &str = "/media/pi";

/// Mounts whose path contains this marker hold settings, never photos
pub const REMOVABLE_SKIP_MARKER: &str = "SETTINGS";

/// Subdirectory created on each removable volume receiving copies
pub const REMOVABLE_SUBDIR: &str = "PhotoboothPhotos";

/// Placeholder written to the audit log when the sender withheld consent
pub const REDACTED_ADDRESS: &str = "xxx@xxx";

/// Default audit log for outgoing emails (one line per attempt)
pub const EMAILS_LOG_FILE: &str = "sendmail.log";

/// Timestamp format used in output filenames (filesystem-safe)
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp format used for picture titles and captions
pub const TITLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used in audit log lines
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// MIME type of every picture the pipeline produces
pub const JPEG_MIME: &str = "image/jpeg";

/// Long-press duration threshold before the admin callback fires
pub const LONG_PRESS_THRESHOLD_MS: u64 = 1000;

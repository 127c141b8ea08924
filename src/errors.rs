// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photobooth pipeline
//!
//! Collaborator-boundary failures are converted to booleans and status
//! text at the call site (see the session and router modules); these
//! types carry the failure between internal steps.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera collaborator errors
    Camera(CameraError),
    /// Capture pipeline errors
    Capture(CaptureError),
    /// Collage composition errors
    Compose(ComposeError),
    /// Archival / fan-out errors
    Persist(PersistError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera collaborator errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Device-level capture failure
    CaptureFailed(String),
    /// Overlay could not be installed
    OverlayFailed(String),
    /// Best-effort cosmetic control (LED, annotation, effect) failed
    CosmeticFailed(String),
}

/// Capture session errors
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// The camera call returned but the expected shot file is absent
    SnapshotMissing(String),
    /// Camera collaborator failure during a shot
    Camera(CameraError),
    /// Collage assembly failed after the shots were taken
    Compose(ComposeError),
    /// The working directory could not be prepared
    Workspace(String),
}

/// Collage composition errors
#[derive(Debug, Clone)]
pub enum ComposeError {
    /// A source shot could not be decoded
    ShotUnreadable(String),
    /// The composed image could not be written
    SaveFailed(String),
}

/// Archival and fan-out errors
#[derive(Debug, Clone)]
pub enum PersistError {
    /// The file to archive does not exist
    MissingSource(String),
    /// The archive directory does not exist (operator-provisioned)
    MissingArchiveDir(String),
    /// Move failed and the copy-then-delete fallback failed too
    WriteFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Compose(e) => write!(f, "Composition error: {}", e),
            AppError::Persist(e) => write!(f, "Persistence error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CameraError::OverlayFailed(msg) => write!(f, "Overlay failed: {}", msg),
            CameraError::CosmeticFailed(msg) => write!(f, "Cosmetic control failed: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::SnapshotMissing(path) => {
                write!(f, "Snapshot file doesn't exist: {}", path)
            }
            CaptureError::Camera(e) => write!(f, "{}", e),
            CaptureError::Compose(e) => write!(f, "{}", e),
            CaptureError::Workspace(msg) => write!(f, "Workspace error: {}", msg),
        }
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::ShotUnreadable(msg) => write!(f, "Shot unreadable: {}", msg),
            ComposeError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::MissingSource(path) => write!(f, "Source file missing: {}", path),
            PersistError::MissingArchiveDir(path) => {
                write!(f, "Archive directory doesn't exist: {}", path)
            }
            PersistError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for ComposeError {}
impl std::error::Error for PersistError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<ComposeError> for AppError {
    fn from(err: ComposeError) -> Self {
        AppError::Compose(err)
    }
}

impl From<PersistError> for AppError {
    fn from(err: PersistError) -> Self {
        AppError::Persist(err)
    }
}

impl From<CameraError> for CaptureError {
    fn from(err: CameraError) -> Self {
        CaptureError::Camera(err)
    }
}

impl From<ComposeError> for CaptureError {
    fn from(err: ComposeError) -> Self {
        CaptureError::Compose(err)
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::WriteFailed(err.to_string())
    }
}

impl From<std::io::Error> for ComposeError {
    fn from(err: std::io::Error) -> Self {
        ComposeError::SaveFailed(err.to_string())
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Persistence fan-out
//!
//! Routes a finished picture to its destinations: the local archive
//! directory, every writable removable volume, the cloud album, email
//! recipients and the print spooler. Each destination fails
//! independently; nothing here propagates an error past the boundary.

use crate::config::Config;
use crate::constants::{
    AUDIT_TIMESTAMP_FORMAT, REDACTED_ADDRESS, REMOVABLE_SKIP_MARKER, REMOVABLE_SUBDIR,
};
use crate::errors::PersistError;
use crate::hardware::{CloudService, Printer};
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Archival and dispatch policy, built once from the configuration
pub struct PersistenceRouter {
    archive_dir: PathBuf,
    archive_to_removable: bool,
    media_root: PathBuf,
    album_id: Option<String>,
    photo_caption: String,
    email_subject: String,
    email_body: String,
    email_logging: bool,
    audit_log_file: PathBuf,
    selected_printer: Option<String>,
}

impl PersistenceRouter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            archive_dir: config.archive_dir.clone(),
            archive_to_removable: config.archive_to_all_removable_drives,
            media_root: config.media_root.clone(),
            album_id: config.album_id.clone(),
            photo_caption: config.photo_caption.clone(),
            email_subject: config.email_subject.clone(),
            email_body: config.email_body.clone(),
            email_logging: config.enable_email_logging,
            audit_log_file: config.audit_log_file.clone(),
            selected_printer: config.selected_printer.clone(),
        }
    }

    /// Move `source` into the archive directory, keeping its base name
    ///
    /// Removable fan-out (when enabled) runs first, while the source
    /// still exists. Rename does not cross filesystems, so a failed
    /// rename falls back to copy-then-delete. On success the returned
    /// path is the picture's final location.
    pub fn archive_locally(&self, source: &Path) -> Result<PathBuf, PersistError> {
        if !source.exists() {
            return Err(PersistError::MissingSource(source.display().to_string()));
        }
        if !self.archive_dir.exists() {
            return Err(PersistError::MissingArchiveDir(
                self.archive_dir.display().to_string(),
            ));
        }

        if self.archive_to_removable {
            self.fan_out_removable(source);
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| PersistError::MissingSource(source.display().to_string()))?;
        let dest = self.archive_dir.join(file_name);

        info!(dest = %dest.display(), "Archiving to local directory");
        if let Err(rename_err) = std::fs::rename(source, &dest) {
            // expected across filesystem boundaries (e.g. tmpfs -> disk)
            warn!(error = %rename_err, "Rename failed, falling back to copy");
            std::fs::copy(source, &dest)?;
            std::fs::remove_file(source)?;
        }

        info!(dest = %dest.display(), "Snap saved");
        Ok(dest)
    }

    /// Copy `source` onto every writable removable volume, best effort
    ///
    /// Mounts whose path contains the settings marker are skipped; one
    /// volume's failure never aborts the others. Returns the number of
    /// copies made.
    pub fn fan_out_removable(&self, source: &Path) -> usize {
        info!(root = %self.media_root.display(), "Archiving to removable volumes");

        let entries = match std::fs::read_dir(&self.media_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.media_root.display(), error = %e, "Cannot enumerate removable volumes");
                return 0;
            }
        };

        let Some(file_name) = source.file_name() else {
            warn!(source = %source.display(), "Source has no base name, skipping fan-out");
            return 0;
        };

        let mut copies = 0;
        for entry in entries.flatten() {
            let mountpoint = entry.path();
            if !mountpoint.is_dir() {
                continue;
            }
            if mountpoint.to_string_lossy().contains(REMOVABLE_SKIP_MARKER) {
                // settings volumes never receive photos
                continue;
            }

            let dest_dir = mountpoint.join(REMOVABLE_SUBDIR);
            if let Err(e) = std::fs::create_dir_all(&dest_dir) {
                warn!(mount = %mountpoint.display(), error = %e, "Volume not writable, skipping");
                continue;
            }

            let dest = dest_dir.join(file_name);
            match std::fs::copy(source, &dest) {
                Ok(_) => {
                    info!(dest = %dest.display(), "Snapshot copied to removable volume");
                    copies += 1;
                }
                Err(e) => {
                    warn!(dest = %dest.display(), error = %e, "Could not write to removable volume");
                }
            }
        }
        copies
    }

    /// Upload a picture to the cloud album; failures become `false`
    pub fn upload(&self, cloud: &mut dyn CloudService, file: &Path, title: &str) -> bool {
        let caption = if self.photo_caption.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", self.photo_caption, title)
        };

        match cloud.upload_picture(file, self.album_id.as_deref(), title, &caption) {
            Ok(()) => {
                info!(title, "Image successfully uploaded");
                true
            }
            Err(e) => {
                error!(error = %e, "Error uploading image");
                false
            }
        }
    }

    /// Email the picture and append one audit line for the attempt
    ///
    /// Without consent the address is redacted in the log; the send
    /// itself always uses the real address.
    pub fn send_email(
        &self,
        cloud: &mut dyn CloudService,
        to: &str,
        file: &Path,
        consent: bool,
    ) -> bool {
        let success = match cloud.send_message(to, &self.email_subject, &self.email_body, file) {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "Mail sending failed");
                false
            }
        };

        if self.email_logging {
            self.append_audit(to, consent, success, file);
        }
        success
    }

    /// Fire-and-forget print of the picture; failures are logged only
    pub fn print(&self, printer: &mut dyn Printer, file: &Path, title: &str) {
        let target = match &self.selected_printer {
            Some(name) => name.clone(),
            None => match printer.list_printers().first() {
                Some(first) => first.clone(),
                None => {
                    error!("No printer installed");
                    return;
                }
            },
        };

        match printer.print_file(&target, file, title) {
            Ok(()) => info!(printer = %target, "Sending to printer"),
            Err(e) => error!(printer = %target, error = %e, "Print failed"),
        }
    }

    // One line per attempt: `[<timestamp>] (<code>) <address> <basename>`
    fn append_audit(&self, address: &str, consent: bool, success: bool, file: &Path) {
        let code = match (consent, success) {
            (true, true) => '*',
            (false, true) => '-',
            (_, false) => 'X',
        };
        let address = if consent { address } else { REDACTED_ADDRESS };
        let basename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        let timestamp = Local::now().format(AUDIT_TIMESTAMP_FORMAT);
        let line = format!("[{}] ({}) {} {}\n", timestamp, code, address, basename);

        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_file)
            .and_then(|mut log| log.write_all(line.as_bytes()));
        if let Err(e) = result {
            error!(path = %self.audit_log_file.display(), error = %e, "Cannot append to audit log");
        }
    }
}

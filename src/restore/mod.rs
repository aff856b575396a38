//! The restore engine.
//!
//! One sequential pass over the backup. With a metadata sidecar every folder
//! is sent to its recorded location, remapped to the current account. Without
//! one, every top level folder is merged into the profile directory.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    backup::{Backup, BackupKind},
    error::{RestoreError, Result},
    metadata::{self, Metadata},
    progress::{CancelToken, Reporter},
    remap::UserProfile,
};

mod archive;
mod copy;
mod folder;

const SEPARATOR_WIDTH: usize = 50;

/// Everything needed to start a restore.
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub backup: PathBuf,
    pub kind: BackupKind,
    pub profile: UserProfile,
}

/// Running totals for a restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub folders_restored: usize,
    pub folders_skipped: usize,
    pub files_restored: usize,
    pub files_failed: usize,
}

/// Opens the requested backup and restores it.
pub fn run_restore(
    request: &RestoreRequest,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> Result<RestoreReport> {
    let mut backup = Backup::open(&request.backup, request.kind)?;
    Restorer::new(&request.profile, reporter, cancel).run(&mut backup)
}

/// A single restore pass over one backup.
pub struct Restorer<'a> {
    profile: &'a UserProfile,
    reporter: &'a Reporter,
    cancel: &'a CancelToken,
    report: RestoreReport,
}

impl<'a> Restorer<'a> {
    pub fn new(profile: &'a UserProfile, reporter: &'a Reporter, cancel: &'a CancelToken) -> Self {
        Self {
            profile,
            reporter,
            cancel,
            report: RestoreReport::default(),
        }
    }

    pub fn run(mut self, backup: &mut Backup) -> Result<RestoreReport> {
        let metadata = self.load_metadata(backup)?;

        let root = backup.path().to_path_buf();
        let names = backup.entry_names().to_vec();

        match metadata {
            Some(metadata) => {
                self.reporter
                    .message("✓ Metadata file found - using intelligent restore");
                self.describe(&metadata);

                match backup.archive_mut() {
                    Some(archive) => {
                        self.restore_archive_with_metadata(&root, archive, &names, &metadata)?
                    }
                    None => self.restore_folders_with_metadata(&root, &metadata)?,
                }
            }
            None => {
                self.reporter
                    .message("⚠ No metadata file found - using basic restore");

                let folders = match backup.kind() {
                    BackupKind::Folder => backup.top_level_folders()?,
                    BackupKind::Compressed => Vec::new(),
                };

                match backup.archive_mut() {
                    Some(archive) => self.restore_archive_basic(&root, archive, &names)?,
                    None => self.restore_folders_basic(&root, &folders)?,
                }
            }
        }

        info!(
            "Restore finished: {} folders, {} files, {} failures",
            self.report.folders_restored, self.report.files_restored, self.report.files_failed
        );

        Ok(self.report)
    }

    /// Reads the sidecar. Unreadable sidecars are reported and ignored, badly
    /// shaped ones abort the restore.
    fn load_metadata(&self, backup: &mut Backup) -> Result<Option<Metadata>> {
        match metadata::load(backup) {
            Ok(Some(raw)) => {
                self.reporter
                    .message(format!("Reading metadata: {}", raw.location));
                Metadata::from_value(raw.document).map(Some)
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Could not read metadata: {e}");
                self.reporter
                    .message(format!("Warning: Could not read metadata: {e}"));
                Ok(None)
            }
        }
    }

    fn describe(&self, metadata: &Metadata) {
        let info = &metadata.backup_info;

        self.reporter
            .message(format!("Original backup user: {}", info.username));
        self.reporter
            .message(format!("Current user: {}", self.profile.account));
        self.reporter
            .message(format!("Backup type: {}", info.backup_type));
        self.reporter.message("-".repeat(SEPARATOR_WIDTH));
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(RestoreError::Cancelled);
        }
        Ok(())
    }

    fn file_failed(&mut self, file: &Path, error: impl std::fmt::Display) {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        warn!("Could not restore {}: {error}", file.display());
        self.reporter
            .message(format!("Warning: Could not restore {name}: {error}"));
        self.report.files_failed += 1;
    }
}

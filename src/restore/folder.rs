//! Restoring from a plain folder backup.

use std::{fs, path::Path};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{Restorer, copy::copy_file};
use crate::{
    error::{RestoreError, Result},
    metadata::Metadata,
    remap::{relative_path, target_for},
};

impl Restorer<'_> {
    pub(super) fn restore_folders_with_metadata(
        &mut self,
        root: &Path,
        metadata: &Metadata,
    ) -> Result<()> {
        self.reporter
            .message(format!("Restoring from folder: {}", root.display()));

        let total = metadata.folders.len();
        let original_username = metadata.backup_info.username.as_str();

        for (idx, folder) in metadata.folders.iter().enumerate() {
            self.check_cancelled()?;

            let target = target_for(folder, original_username, self.profile);
            let source = root.join(relative_path(&folder.backup_location));

            self.reporter.message(format!(
                "Restoring {} to {}...",
                folder.folder_name,
                target.display()
            ));

            if source.exists() {
                self.restore_folder(&folder.folder_name, &source, &target)?;
            } else {
                warn!("{} not found at {}", folder.folder_name, source.display());
                self.reporter.message(format!(
                    "⚠ Skipping {} - not found in backup",
                    folder.folder_name
                ));
                self.report.folders_skipped += 1;
            }

            self.reporter.progress(idx + 1, total);
        }

        self.reporter
            .message("✓ Folder backup restored successfully!");
        Ok(())
    }

    pub(super) fn restore_folders_basic(&mut self, root: &Path, folders: &[String]) -> Result<()> {
        self.reporter
            .message(format!("Restoring from folder: {}", root.display()));

        let total = folders.len();

        for (idx, name) in folders.iter().enumerate() {
            self.check_cancelled()?;

            let source = root.join(name);
            let target = self.profile.home.join(name);

            self.reporter.message(format!("Restoring {name}..."));
            self.restore_folder(name, &source, &target)?;

            self.reporter.progress(idx + 1, total);
        }

        self.reporter
            .message("✓ Folder backup restored successfully!");
        Ok(())
    }

    /// Copies one folder and reports the result. Only cancellation escapes.
    fn restore_folder(&mut self, name: &str, source: &Path, target: &Path) -> Result<()> {
        match self.copy_tree(source, target) {
            Ok(()) => {
                self.reporter
                    .message(format!("✓ {name} restored successfully"));
                self.report.folders_restored += 1;
                Ok(())
            }
            Err(RestoreError::Cancelled) => Err(RestoreError::Cancelled),
            Err(e) => {
                warn!("Error restoring {name}: {e}");
                self.reporter
                    .message(format!("✗ Error restoring {name}: {e}"));
                Ok(())
            }
        }
    }

    /// Recursively merges `source` into `target`, overwriting files.
    fn copy_tree(&mut self, source: &Path, target: &Path) -> Result<()> {
        fs::create_dir_all(target)
            .map_err(|e| RestoreError::io(format!("create {}", target.display()), e))?;

        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            self.check_cancelled()?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source).to_path_buf();
                    self.file_failed(&path, e);
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let destination = target.join(relative);

            if entry.file_type().is_dir() {
                if let Err(e) = fs::create_dir_all(&destination) {
                    self.file_failed(entry.path(), e);
                }
                continue;
            }

            match copy_file(entry.path(), &destination) {
                Ok(bytes) => {
                    debug!("Restored {} ({bytes} bytes)", destination.display());
                    self.report.files_restored += 1;
                }
                Err(e) => self.file_failed(entry.path(), e),
            }
        }

        Ok(())
    }
}

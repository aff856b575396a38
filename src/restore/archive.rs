//! Restoring from a ZIP backup.

use std::{fs, fs::File, path::Path};

use tracing::debug;
use zip::ZipArchive;

use super::{Restorer, copy::write_file};
use crate::{
    backup::PROGRAMS_LIST_NAME,
    error::{RestoreError, Result},
    metadata::{Metadata, is_metadata_entry},
    remap::{enclosed_path, normalize_entry, strip_location, target_for},
};

/// Progress is reported every this many files.
const PROGRESS_INTERVAL: usize = 10;

impl Restorer<'_> {
    pub(super) fn restore_archive_with_metadata(
        &mut self,
        root: &Path,
        archive: &mut ZipArchive<File>,
        names: &[String],
        metadata: &Metadata,
    ) -> Result<()> {
        self.reporter
            .message(format!("Extracting backup from: {}", root.display()));

        let plans: Vec<_> = metadata
            .folders
            .iter()
            .map(|folder| folder_entries(names, &folder.backup_location))
            .collect();

        let total: usize = plans.iter().map(Vec::len).sum();
        let original_username = metadata.backup_info.username.as_str();
        let mut processed = 0;

        for (folder, entries) in metadata.folders.iter().zip(&plans) {
            self.check_cancelled()?;

            let target = target_for(folder, original_username, self.profile);
            self.reporter.message(format!(
                "Restoring {} to {}...",
                folder.folder_name,
                target.display()
            ));

            if entries.is_empty() {
                self.reporter.message(format!(
                    "⚠ Skipping {} - not found in backup",
                    folder.folder_name
                ));
                self.report.folders_skipped += 1;
                continue;
            }

            for (name, rest) in entries {
                self.check_cancelled()?;

                match enclosed_path(rest) {
                    Some(relative) => self.extract(archive, name, &target.join(relative)),
                    None => self.file_failed(Path::new(name), "path leaves the restore folder"),
                }

                processed += 1;
                if processed % PROGRESS_INTERVAL == 0 {
                    self.reporter.progress(processed, total);
                }
            }

            self.reporter.message(format!(
                "✓ {} restored successfully",
                folder.folder_name
            ));
            self.report.folders_restored += 1;
            self.reporter.progress(processed, total);
        }

        self.reporter
            .message("✓ Compressed backup restored successfully!");
        Ok(())
    }

    pub(super) fn restore_archive_basic(
        &mut self,
        root: &Path,
        archive: &mut ZipArchive<File>,
        names: &[String],
    ) -> Result<()> {
        self.reporter
            .message(format!("Extracting backup from: {}", root.display()));

        let total = names.len();

        for (idx, name) in names.iter().enumerate() {
            self.check_cancelled()?;

            match enclosed_path(name) {
                Some(relative) if is_directory_entry(name) => {
                    let destination = self.profile.home.join(relative);
                    if let Err(e) = fs::create_dir_all(&destination) {
                        self.file_failed(Path::new(name), e);
                    }
                }
                Some(relative) => {
                    let destination = self.profile.home.join(relative);
                    self.extract(archive, name, &destination);
                }
                None => self.file_failed(Path::new(name), "path leaves the restore folder"),
            }

            if idx % PROGRESS_INTERVAL == 0 {
                self.reporter.message(format!("Restoring: {name}"));
            }
            self.reporter.progress(idx + 1, total);
        }

        self.reporter
            .message("✓ Compressed backup restored successfully!");
        Ok(())
    }

    fn extract(&mut self, archive: &mut ZipArchive<File>, name: &str, destination: &Path) {
        let result = archive
            .by_name(name)
            .map_err(RestoreError::from)
            .and_then(|mut entry| {
                write_file(&mut entry, destination)
                    .map_err(|e| RestoreError::io(format!("write {}", destination.display()), e))
            });

        match result {
            Ok(bytes) => {
                debug!("Extracted {name} to {} ({bytes} bytes)", destination.display());
                self.report.files_restored += 1;
            }
            Err(e) => self.file_failed(Path::new(name), e),
        }
    }
}

/// File entries below `location`, paired with their path relative to it.
///
/// Directory entries, the location itself and the backup tool's own sidecar
/// files are left out.
fn folder_entries<'n>(names: &'n [String], location: &str) -> Vec<(&'n str, String)> {
    let location = normalize_entry(location);

    names
        .iter()
        .filter(|name| !is_directory_entry(name) && !is_sidecar(name))
        .filter_map(|name| {
            let normalized = normalize_entry(name);
            let rest = strip_location(&normalized, &location)?;
            (!rest.is_empty()).then(|| (name.as_str(), rest.to_owned()))
        })
        .collect()
}

fn is_directory_entry(name: &str) -> bool {
    name.ends_with('/') || name.ends_with('\\')
}

fn is_sidecar(name: &str) -> bool {
    is_metadata_entry(name) || name == PROGRAMS_LIST_NAME
}

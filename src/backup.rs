//! Opening a backup, either a plain folder tree or a ZIP file.

use std::{
    collections::BTreeSet,
    fmt, fs,
    fs::File,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;
use zip::{ZipArchive, result::ZipError};

use crate::error::{RestoreError, Result};

/// Sidecar files the backup tool writes next to the copied folders.
pub const PROGRAMS_LIST_NAME: &str = "Installed_Programs.txt";

/// The shape of a backup on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Folder,
    Compressed,
}

impl BackupKind {
    /// Regular files are treated as ZIP archives, everything else as a folder.
    pub fn detect(path: &Path) -> Self {
        if path.is_file() {
            Self::Compressed
        } else {
            Self::Folder
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Folder => "Folder",
            Self::Compressed => "Compressed ZIP",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An opened backup.
pub struct Backup {
    path: PathBuf,
    source: Source,
}

enum Source {
    Folder,
    Zip {
        archive: ZipArchive<File>,
        names: Vec<String>,
    },
}

impl Backup {
    pub fn open(path: impl Into<PathBuf>, kind: BackupKind) -> Result<Self> {
        let path = path.into();

        let source = match kind {
            BackupKind::Folder => {
                if !path.is_dir() {
                    return Err(RestoreError::InvalidBackupFolder(path));
                }
                Source::Folder
            }
            BackupKind::Compressed => {
                let file = File::open(&path)
                    .map_err(|e| RestoreError::io(format!("open {}", path.display()), e))?;
                let archive = ZipArchive::new(file)?;

                let names = (0..archive.len())
                    .map(|i| {
                        archive
                            .name_for_index(i)
                            .map(str::to_owned)
                            .ok_or(ZipError::FileNotFound)
                    })
                    .collect::<core::result::Result<Vec<_>, _>>()?;

                Source::Zip { archive, names }
            }
        };

        Ok(Self { path, source })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> BackupKind {
        match self.source {
            Source::Folder => BackupKind::Folder,
            Source::Zip { .. } => BackupKind::Compressed,
        }
    }

    /// Entry names in archive order. Empty for folder backups.
    pub fn entry_names(&self) -> &[String] {
        match &self.source {
            Source::Folder => &[],
            Source::Zip { names, .. } => names,
        }
    }

    /// The underlying archive, if this is a ZIP backup.
    pub fn archive_mut(&mut self) -> Option<&mut ZipArchive<File>> {
        match &mut self.source {
            Source::Folder => None,
            Source::Zip { archive, .. } => Some(archive),
        }
    }

    /// Names restored by a basic restore, sorted.
    ///
    /// For folders these are the immediate sub-directories. For archives they
    /// are the distinct first path segments of every entry.
    pub fn top_level_folders(&self) -> Result<Vec<String>> {
        match &self.source {
            Source::Folder => {
                let entries = fs::read_dir(&self.path)
                    .map_err(|e| RestoreError::io(format!("list {}", self.path.display()), e))?;

                let mut folders = Vec::new();
                for entry in entries {
                    let entry = entry
                        .map_err(|e| RestoreError::io(format!("list {}", self.path.display()), e))?;
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if entry.path().is_dir() && name != PROGRAMS_LIST_NAME {
                        folders.push(name);
                    }
                }
                folders.sort();

                Ok(folders)
            }
            Source::Zip { names, .. } => {
                let folders: BTreeSet<String> = names
                    .iter()
                    .filter_map(|name| first_segment(name))
                    .map(str::to_owned)
                    .collect();

                Ok(folders.into_iter().collect())
            }
        }
    }

    /// Number of files that a basic restore would touch.
    pub fn file_count(&self) -> Result<usize> {
        match &self.source {
            Source::Folder => {
                let mut total = 0;
                for folder in self.top_level_folders()? {
                    total += WalkDir::new(self.path.join(folder))
                        .into_iter()
                        .filter_map(|entry| entry.ok())
                        .filter(|entry| entry.file_type().is_file())
                        .count();
                }
                Ok(total)
            }
            Source::Zip { names, .. } => Ok(names.len()),
        }
    }
}

impl fmt::Debug for Backup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backup")
            .field("path", &self.path)
            .field("kind", &self.kind())
            .finish()
    }
}

/// First non-empty path segment of an archive entry, split on either
/// separator.
pub(crate) fn first_segment(name: &str) -> Option<&str> {
    name.split(['/', '\\']).find(|segment| !segment.is_empty())
}

//! A read-only look at a backup before restoring it.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    backup::{Backup, BackupKind},
    error::Result,
    metadata::{self, Metadata},
};

const RULE_WIDTH: usize = 60;

/// What a restore of this backup would touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPreview {
    pub location: PathBuf,
    pub kind: BackupKind,
    pub metadata: Option<Metadata>,
    pub total_files: usize,
    pub folders: Vec<String>,
}

/// Analyzes a backup without writing anything.
///
/// An unreadable sidecar is reported as no metadata, since the restore falls
/// back to a basic restore for it. A sidecar with the wrong shape is an error,
/// because the restore would abort on it.
pub fn preview(path: &Path, kind: BackupKind) -> Result<BackupPreview> {
    let mut backup = Backup::open(path, kind)?;

    let metadata = match metadata::load(&mut backup) {
        Ok(Some(raw)) => Some(Metadata::from_value(raw.document)?),
        Ok(None) | Err(_) => None,
    };

    Ok(BackupPreview {
        location: path.to_path_buf(),
        kind,
        metadata,
        total_files: backup.file_count()?,
        folders: backup.top_level_folders()?,
    })
}

impl BackupPreview {
    fn backup_date(metadata: &Metadata) -> String {
        let info = &metadata.backup_info;

        match (info.timestamp(), info.datetime.as_deref()) {
            (Some(timestamp), _) => timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            (None, Some(raw)) if !raw.is_empty() => raw.to_owned(),
            _ => "Unknown".to_owned(),
        }
    }
}

impl fmt::Display for BackupPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(f, " Backup Restore Preview")?;
        writeln!(f, "{rule}")?;
        writeln!(f, " Backup location:    {}", self.location.display())?;
        writeln!(f, " Type:               {}", self.kind)?;

        match &self.metadata {
            Some(metadata) => {
                let username = match metadata.backup_info.username.as_str() {
                    "" => "Unknown",
                    name => name,
                };

                writeln!(f, " Backup date:        {}", Self::backup_date(metadata))?;
                writeln!(f, " Original user:      {username}")?;
                writeln!(f, " Has metadata:       Yes")?;

                let user_folders = metadata.user_folder_names();
                if !user_folders.is_empty() {
                    writeln!(f, " User folders:       {}", user_folders.join(", "))?;
                }

                let custom_folders = metadata.custom_folder_names();
                if !custom_folders.is_empty() {
                    writeln!(f, " Custom folders:     {}", custom_folders.join(", "))?;
                }
            }
            None => writeln!(f, " Has metadata:       No (will use basic restore)")?,
        }

        let approximate = match self.kind {
            BackupKind::Folder => "~",
            BackupKind::Compressed => "",
        };
        writeln!(f, " Total files:        {approximate}{}", self.total_files)?;
        writeln!(f, " Folders to restore: {}", self.folders.join(", "))?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{error::RestoreError, metadata::METADATA_FILE_NAME};

    #[test]
    fn folder_without_metadata() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Desktop")).unwrap();
        fs::write(temp.path().join("Desktop/a.txt"), b"a").unwrap();

        let preview = preview(temp.path(), BackupKind::Folder).unwrap();
        assert!(preview.metadata.is_none());
        assert_eq!(preview.total_files, 1);
        assert_eq!(preview.folders, ["Desktop"]);

        let rendered = preview.to_string();
        assert!(rendered.contains("Has metadata:       No (will use basic restore)"));
        assert!(rendered.contains("Total files:        ~1"));
    }

    #[test]
    fn folder_with_metadata() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Documents")).unwrap();
        fs::write(
            temp.path().join(METADATA_FILE_NAME),
            r#"{
                "backup_info": { "datetime": "2024-03-01 10:15:00", "username": "" },
                "folders": [
                    { "folder_name": "Documents", "original_path": "C:\\Users\\bob\\Documents",
                      "backup_location": "Documents", "folder_type": "user_folder" },
                    { "folder_name": "Projects", "original_path": "D:\\Projects",
                      "backup_location": "Projects", "folder_type": "custom_folder" }
                ]
            }"#,
        )
        .unwrap();

        let rendered = preview(temp.path(), BackupKind::Folder).unwrap().to_string();
        assert!(rendered.contains("Backup date:        2024-03-01 10:15:00"));
        assert!(rendered.contains("Original user:      Unknown"));
        assert!(rendered.contains("User folders:       Documents"));
        assert!(rendered.contains("Custom folders:     Projects"));
    }

    #[test]
    fn broken_metadata_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METADATA_FILE_NAME), "{ not json").unwrap();

        let preview = preview(temp.path(), BackupKind::Folder).unwrap();
        assert!(preview.metadata.is_none());
    }

    #[test]
    fn misshapen_metadata_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Desktop")).unwrap();
        fs::write(
            temp.path().join(METADATA_FILE_NAME),
            r#"{"folders":[{"folder_name":"Desktop"}]}"#,
        )
        .unwrap();

        let error = preview(temp.path(), BackupKind::Folder).unwrap_err();
        assert!(matches!(error, RestoreError::MalformedMetadata(_)));
        assert!(error.to_string().contains("original_path"));
    }

    #[test]
    fn empty_metadata_means_basic_restore() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METADATA_FILE_NAME), "null").unwrap();

        let preview = preview(temp.path(), BackupKind::Folder).unwrap();
        assert!(preview.metadata.is_none());
    }
}

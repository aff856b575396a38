//! The optional `Backup_Metadata.json` sidecar written by the backup tool.
//!
//! The sidecar records which account made the backup and where each folder
//! originally lived, so a restore under a different account can put things
//! back in the right place.

use std::{fs::File, io::BufReader};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    backup::Backup,
    error::{MetadataError, RestoreError},
};

/// File name of the sidecar in a folder backup.
pub const METADATA_FILE_NAME: &str = "Backup_Metadata.json";

const METADATA_MARKER: &str = "Backup_Metadata";

/// The whole sidecar document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub backup_info: BackupInfo,

    #[serde(default)]
    pub folders: Vec<FolderEntry>,
}

/// Who made the backup, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    #[serde(default)]
    pub datetime: Option<String>,

    /// Account name of the backup owner. Empty when unknown.
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub backup_type: String,
}

impl BackupInfo {
    /// The backup time, if `datetime` is in a format we recognise.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.datetime.as_deref()?.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.naive_local());
        }

        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d_%H-%M-%S"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }
}

/// One folder recorded in the backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Display name, e.g. `Documents`.
    pub folder_name: String,

    /// Absolute path the folder was copied from.
    pub original_path: String,

    /// Location inside the backup, relative to its root.
    pub backup_location: String,

    pub folder_type: FolderType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderType {
    /// Lives under the account's profile directory.
    #[serde(rename = "user_folder")]
    UserFolder,

    /// Restored to its original path untouched. Unknown tags land here too.
    #[serde(rename = "custom_folder", other)]
    Custom,
}

impl Metadata {
    /// Converts a parsed JSON document into typed metadata.
    ///
    /// Well-formed JSON with the wrong shape is fatal for the restore.
    pub fn from_value(value: Value) -> Result<Self, RestoreError> {
        serde_json::from_value(value).map_err(RestoreError::MalformedMetadata)
    }

    pub fn user_folder_names(&self) -> Vec<&str> {
        self.folder_names(FolderType::UserFolder)
    }

    pub fn custom_folder_names(&self) -> Vec<&str> {
        self.folder_names(FolderType::Custom)
    }

    fn folder_names(&self, folder_type: FolderType) -> Vec<&str> {
        self.folders
            .iter()
            .filter(|folder| folder.folder_type == folder_type)
            .map(|folder| folder.folder_name.as_str())
            .collect()
    }
}

/// A sidecar found in a backup, before its shape has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetadata {
    /// Where the sidecar was read from, for display.
    pub location: String,

    pub document: Value,
}

/// Looks for the sidecar in a backup and parses it as JSON.
///
/// Returns `Ok(None)` when the backup has no sidecar, or when the sidecar
/// holds an empty document (`null`, `{}`, `[]`, `""`, `0`, `false`).
pub fn load(backup: &mut Backup) -> Result<Option<RawMetadata>, MetadataError> {
    let raw = find(backup)?;
    Ok(raw.filter(|raw| !is_empty_document(&raw.document)))
}

fn find(backup: &mut Backup) -> Result<Option<RawMetadata>, MetadataError> {
    let sidecar = backup
        .entry_names()
        .iter()
        .find(|name| is_metadata_entry(name))
        .cloned();

    if let Some(archive) = backup.archive_mut() {
        let Some(name) = sidecar else {
            return Ok(None);
        };

        let entry = archive.by_name(&name)?;
        let document = serde_json::from_reader(BufReader::new(entry))?;

        return Ok(Some(RawMetadata {
            location: name,
            document,
        }));
    }

    let path = backup.path().join(METADATA_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(&path)?;
    let document = serde_json::from_reader(BufReader::new(file))?;

    Ok(Some(RawMetadata {
        location: path.display().to_string(),
        document,
    }))
}

fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Bool(value) => !value,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Whether an archive entry name is the metadata sidecar.
pub fn is_metadata_entry(name: &str) -> bool {
    name.contains(METADATA_MARKER) && name.ends_with(".json")
}

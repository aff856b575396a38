//! Restores a folder or ZIP backup into the current user's profile folders,
//! remapping paths when the backup was made under a different account.

pub mod backup;
pub mod error;
pub mod logger;
pub mod metadata;
pub mod preview;
pub mod progress;
pub mod remap;
pub mod restore;
pub mod worker;

pub use backup::{Backup, BackupKind};
pub use error::{MetadataError, RestoreError};
pub use metadata::{BackupInfo, FolderEntry, FolderType, Metadata};
pub use preview::{BackupPreview, preview};
pub use progress::{CancelToken, Reporter, RestoreEvent, RestoreOutcome};
pub use remap::UserProfile;
pub use restore::{RestoreReport, RestoreRequest, Restorer, run_restore};
pub use worker::{RestoreHandle, RestoreWorker};

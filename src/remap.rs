//! Working out where each backed up folder goes on this machine.

use std::path::{Path, PathBuf};

use crate::{
    error::{RestoreError, Result},
    metadata::{FolderEntry, FolderType},
};

/// The account the restore is running for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Profile directory, e.g. `C:\Users\alice` or `/home/alice`.
    pub home: PathBuf,

    /// Account name, the last component of `home` unless overridden.
    pub account: String,
}

impl UserProfile {
    pub fn new(home: impl Into<PathBuf>, account: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            account: account.into(),
        }
    }

    /// The profile of whoever is running this process.
    pub fn current() -> Result<Self> {
        Self::resolve(None, None)
    }

    /// Builds a profile from optional overrides, filling the gaps from the
    /// running account.
    pub fn resolve(home: Option<PathBuf>, account: Option<String>) -> Result<Self> {
        let home = match home {
            Some(home) => home,
            None => dirs_next::home_dir().ok_or(RestoreError::NoHomeDirectory)?,
        };

        let account = account.unwrap_or_else(|| account_of(&home));

        Ok(Self { home, account })
    }
}

fn account_of(home: &Path) -> String {
    home.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Destination for a folder recorded in the metadata.
pub fn target_for(entry: &FolderEntry, original_username: &str, profile: &UserProfile) -> PathBuf {
    match entry.folder_type {
        FolderType::UserFolder if !original_username.is_empty() => PathBuf::from(replace_account(
            &entry.original_path,
            original_username,
            &profile.account,
        )),
        FolderType::UserFolder => profile.home.join(&entry.folder_name),
        FolderType::Custom => PathBuf::from(&entry.original_path),
    }
}

/// Swaps `Users\<old>` and `Users/<old>` for the new account name.
///
/// Only whole segments match: `Users\bob` is rewritten, `Users\bobby` is not.
pub fn replace_account(path: &str, old: &str, new: &str) -> String {
    if old.is_empty() || old == new {
        return path.to_owned();
    }

    let mut output = path.to_owned();
    for separator in ['\\', '/'] {
        let needle = format!("Users{separator}{old}");
        let replacement = format!("Users{separator}{new}");
        output = replace_on_boundary(&output, &needle, &replacement);
    }

    output
}

fn replace_on_boundary(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut output = String::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(start) = rest.find(needle) {
        let end = start + needle.len();
        let at_boundary = rest[end..]
            .chars()
            .next()
            .is_none_or(|next| next == '\\' || next == '/');

        output.push_str(&rest[..start]);
        output.push_str(if at_boundary { replacement } else { needle });
        rest = &rest[end..];
    }
    output.push_str(rest);

    output
}

/// Converts a backup relative location using either separator into a
/// relative path. Empty, `.` and `..` segments are dropped.
pub fn relative_path(location: &str) -> PathBuf {
    location
        .split(['\\', '/'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect()
}

/// Relative path for an archive entry name, or `None` if the name tries to
/// climb out of its destination or names nothing.
///
/// A leading drive segment such as `C:` is dropped.
pub fn enclosed_path(name: &str) -> Option<PathBuf> {
    let mut segments = name
        .split(['\\', '/'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .peekable();

    if segments.peek().is_some_and(|first| is_drive(first)) {
        segments.next();
    }

    let mut path = PathBuf::new();
    for segment in segments {
        if segment == ".." {
            return None;
        }
        path.push(segment);
    }

    (!path.as_os_str().is_empty()).then_some(path)
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Backslashes to forward slashes, without trailing separators.
pub(crate) fn normalize_entry(name: &str) -> String {
    name.replace('\\', "/").trim_end_matches('/').to_owned()
}

/// The part of an archive entry below `location`, if the entry lies inside
/// it. Both sides must already be normalized.
pub(crate) fn strip_location<'a>(entry: &'a str, location: &str) -> Option<&'a str> {
    if location.is_empty() {
        return Some(entry);
    }

    let rest = entry.strip_prefix(location)?;
    if rest.is_empty() {
        return Some(rest);
    }

    rest.strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, original: &str, folder_type: FolderType) -> FolderEntry {
        FolderEntry {
            folder_name: name.to_owned(),
            original_path: original.to_owned(),
            backup_location: name.to_owned(),
            folder_type,
        }
    }

    fn alice() -> UserProfile {
        UserProfile::new("/home/alice", "alice")
    }

    #[test]
    fn user_folder_is_remapped() {
        let desktop = entry("Desktop", "C:\\Users\\bob\\Desktop", FolderType::UserFolder);
        assert_eq!(
            target_for(&desktop, "bob", &alice()),
            PathBuf::from("C:\\Users\\alice\\Desktop")
        );

        let documents = entry("Documents", "C:/Users/bob/Documents", FolderType::UserFolder);
        assert_eq!(
            target_for(&documents, "bob", &alice()),
            PathBuf::from("C:/Users/alice/Documents")
        );
    }

    #[test]
    fn user_folder_without_username_goes_home() {
        let desktop = entry("Desktop", "C:\\Users\\bob\\Desktop", FolderType::UserFolder);
        assert_eq!(
            target_for(&desktop, "", &alice()),
            PathBuf::from("/home/alice/Desktop")
        );
    }

    #[test]
    fn custom_folder_is_untouched() {
        let projects = entry("Projects", "C:\\Users\\bob\\Projects", FolderType::Custom);
        assert_eq!(
            target_for(&projects, "bob", &alice()),
            PathBuf::from("C:\\Users\\bob\\Projects")
        );
    }

    #[test]
    fn replacement_respects_segment_boundaries() {
        assert_eq!(
            replace_account("C:\\Users\\bobby\\Desktop", "bob", "alice"),
            "C:\\Users\\bobby\\Desktop"
        );
        assert_eq!(replace_account("C:\\Users\\bob", "bob", "alice"), "C:\\Users\\alice");
        assert_eq!(
            replace_account("C:\\Users\\Bob\\Desktop", "bob", "alice"),
            "C:\\Users\\Bob\\Desktop"
        );
    }

    #[test]
    fn replacement_rewrites_every_occurrence() {
        assert_eq!(
            replace_account("/mnt/Users/bob/link/Users/bob", "bob", "alice"),
            "/mnt/Users/alice/link/Users/alice"
        );
    }

    #[test]
    fn same_account_is_a_no_op() {
        assert_eq!(
            replace_account("C:\\Users\\bob\\Desktop", "bob", "bob"),
            "C:\\Users\\bob\\Desktop"
        );
    }

    #[test]
    fn relative_path_accepts_both_separators() {
        assert_eq!(relative_path("Documents\\Work"), PathBuf::from("Documents/Work"));
        assert_eq!(relative_path("Documents/Work/"), PathBuf::from("Documents/Work"));
        assert_eq!(relative_path("..\\..\\etc/./passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(relative_path(""), PathBuf::new());
    }

    #[test]
    fn enclosed_path_rejects_escapes() {
        assert_eq!(enclosed_path("Desktop/a.txt"), Some(PathBuf::from("Desktop/a.txt")));
        assert_eq!(enclosed_path("C:\\Users\\a.txt"), Some(PathBuf::from("Users/a.txt")));
        assert_eq!(enclosed_path("./Music/b.mp3"), Some(PathBuf::from("Music/b.mp3")));
        assert_eq!(enclosed_path("../outside.txt"), None);
        assert_eq!(enclosed_path("Desktop/../../outside.txt"), None);
        assert_eq!(enclosed_path("/"), None);
    }

    #[test]
    fn strip_location_matches_whole_segments() {
        assert_eq!(strip_location("Desktop/a.txt", "Desktop"), Some("a.txt"));
        assert_eq!(strip_location("Desktop/sub/a.txt", "Desktop"), Some("sub/a.txt"));
        assert_eq!(strip_location("Desktop", "Desktop"), Some(""));
        assert_eq!(strip_location("Desktop2/a.txt", "Desktop"), None);
        assert_eq!(strip_location("Music/a.mp3", "Desktop"), None);
    }

    #[test]
    fn normalize_entry_names() {
        assert_eq!(normalize_entry("Custom\\Projects\\"), "Custom/Projects");
        assert_eq!(normalize_entry("Desktop/a.txt"), "Desktop/a.txt");
    }

    #[test]
    fn resolve_prefers_overrides() {
        let profile = UserProfile::resolve(Some(PathBuf::from("/home/carol")), None).unwrap();
        assert_eq!(profile.account, "carol");

        let profile =
            UserProfile::resolve(Some(PathBuf::from("/home/carol")), Some("dave".into())).unwrap();
        assert_eq!(profile.account, "dave");
        assert_eq!(profile.home, PathBuf::from("/home/carol"));
    }
}

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read},
    path::Path,
};

use tracing::debug;

/// Copies one file, overwriting the destination and keeping the source's
/// modification time.
pub(super) fn copy_file(source: &Path, destination: &Path) -> io::Result<u64> {
    create_parent(destination)?;

    let bytes = fs::copy(source, destination)?;

    if let Ok(modified) = fs::metadata(source).and_then(|metadata| metadata.modified()) {
        let result = OpenOptions::new()
            .write(true)
            .open(destination)
            .and_then(|file| file.set_modified(modified));

        if let Err(e) = result {
            debug!("Could not keep modification time of {}: {e}", destination.display());
        }
    }

    Ok(bytes)
}

/// Streams a reader into a new file, overwriting the destination.
pub(super) fn write_file(reader: &mut impl Read, destination: &Path) -> io::Result<u64> {
    create_parent(destination)?;

    let mut file = File::create(destination)?;
    io::copy(reader, &mut file)
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn copy_creates_parents_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.txt");
        let destination = temp.path().join("a/b/destination.txt");
        fs::write(&source, b"new").unwrap();

        copy_file(&source, &destination).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"new");

        fs::write(&source, b"newer").unwrap();
        copy_file(&source, &destination).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"newer");
    }

    #[test]
    fn copy_keeps_modification_time() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.txt");
        let destination = temp.path().join("destination.txt");
        fs::write(&source, b"old").unwrap();

        let past = SystemTime::now() - Duration::from_secs(60 * 60 * 24);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(past)
            .unwrap();

        copy_file(&source, &destination).unwrap();

        let copied = fs::metadata(&destination).unwrap().modified().unwrap();
        let original = fs::metadata(&source).unwrap().modified().unwrap();
        assert_eq!(copied, original);
    }

    #[test]
    fn write_file_streams_reader() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("nested/out.bin");

        let written = write_file(&mut &b"payload"[..], &destination).unwrap();
        assert_eq!(written, 7);
        assert_eq!(fs::read(&destination).unwrap(), b"payload");
    }

    #[test]
    fn copy_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let result = copy_file(&temp.path().join("missing"), &temp.path().join("out"));
        assert!(result.is_err());
    }
}

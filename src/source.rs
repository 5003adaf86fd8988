use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Supplies document text and accepts write-back of mutated text.
pub trait DocumentSource {
    /// Read the full UTF-8 contents of `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replace the contents of `path` with `content`.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// Filesystem-backed source with atomic write-back.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl DocumentSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<String> {
        // Non-UTF-8 input surfaces as io::ErrorKind::InvalidData
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        atomic_write(path, content.as_bytes())?;

        // Bump mtime so dev servers and watchers pick the change up
        let now = filetime::FileTime::now();
        filetime::set_file_mtime(path, now)
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the original file is left untouched.
/// The original file's permissions are carried over to the replacement.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    // Tempfile in the same directory keeps the rename on one filesystem
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Card.tsx");
        fs::write(&file, "<div className=\"rounded-3xl\"/>").unwrap();

        let source = FsSource;
        let content = source.read(&file).unwrap();
        source
            .write(&file, &content.replace("rounded-3xl", "rounded-lg"))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "<div className=\"rounded-lg\"/>"
        );
        // No stray tempfiles left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.tsx");
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

        let err = FsSource.read(&file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    #[cfg(unix)]
    fn test_write_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.tsx");
        fs::write(&file, "a").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

        FsSource.write(&file, "b").unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}

//! Content hashing and atomic file writes shared by the ledger and reconciler.

use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Trailing tag on every temporary file this tool creates, so stray temp
/// files left by a crash are recognizable.
pub const TEMP_TAG: &str = "~converge";

/// Compute the algorithm-tagged content hash of a byte buffer.
///
/// The format is `sha256-<64 lowercase hex chars>`, matching the values
/// persisted in the state ledger.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(7 + 64);
    out.push_str("sha256-");
    for b in &digest {
        // write! to a String is infallible; unwrap_or(()) makes that explicit.
        write!(out, "{b:02x}").unwrap_or(());
    }
    out
}

/// Hash the file at `path`, returning `None` when the file does not exist.
pub fn hash_file(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(hash_bytes(&data))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Atomically replace the file at `path` with `content`.
///
/// Writes a sibling temporary file in the same directory and renames it over
/// the final path, so a partially-written target is never observable. The
/// temporary name is `.` + the file name (if not already dot-prefixed) + `.`
/// + six random alphanumeric characters + [`TEMP_TAG`].
///
/// Parent directories are created as needed.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let prefix = if name.starts_with('.') {
        format!("{name}.")
    } else {
        format!(".{name}.")
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_TAG)
        .rand_bytes(6)
        .tempfile_in(parent)?;
    tmp.write_all(content)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove now-empty ancestor directories of a deleted file, walking upward
/// until a non-empty or protected directory stops the walk. Best-effort:
/// any removal failure ends the walk silently.
pub fn prune_empty_dirs(path: &Path) {
    for parent in path.ancestors().skip(1) {
        if std::fs::remove_dir(parent).is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_known_value() {
        // echo -n "hello world" | sha256sum
        assert_eq!(
            hash_bytes(b"hello world"),
            "sha256-b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn hash_bytes_is_tagged_and_lowercase() {
        let hash = hash_bytes(b"");
        assert!(hash.starts_with("sha256-"));
        assert_eq!(hash.len(), 7 + 64);
        assert!(hash.chars().skip(7).all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_file_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(hash_file(&missing).unwrap(), None);
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"content").unwrap();
        assert_eq!(hash_file(&file).unwrap(), Some(hash_bytes(b"content")));
    }

    // -----------------------------------------------------------------------
    // atomic_write
    // -----------------------------------------------------------------------

    #[test]
    fn atomic_write_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/config");
        atomic_write(&target, b"data").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"data");
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file");
        std::fs::write(&target, b"old").unwrap();
        atomic_write(&target, b"new").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file");
        atomic_write(&target, b"data").unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["file".to_string()]);
    }

    #[test]
    fn atomic_write_rejects_nameless_path() {
        assert!(atomic_write(Path::new("/"), b"data").is_err());
    }

    // -----------------------------------------------------------------------
    // prune_empty_dirs
    // -----------------------------------------------------------------------

    #[test]
    fn prune_removes_empty_ancestors_up_to_nonempty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep"), b"x").unwrap();
        let nested = dir.path().join("a/b/c/file");
        std::fs::create_dir_all(nested.parent().unwrap()).unwrap();
        std::fs::write(&nested, b"x").unwrap();
        std::fs::remove_file(&nested).unwrap();

        prune_empty_dirs(&nested);

        assert!(!dir.path().join("a").exists(), "empty chain should be pruned");
        assert!(dir.path().exists(), "non-empty ancestor must survive");
        assert!(dir.path().join("keep").exists());
    }

    #[test]
    fn prune_stops_at_directory_with_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/file");
        std::fs::create_dir_all(nested.parent().unwrap()).unwrap();
        std::fs::write(dir.path().join("a/other"), b"x").unwrap();
        std::fs::write(&nested, b"x").unwrap();
        std::fs::remove_file(&nested).unwrap();

        prune_empty_dirs(&nested);

        assert!(!dir.path().join("a/b").exists());
        assert!(dir.path().join("a").exists(), "dir with sibling file survives");
    }
}

use std::fs;
use std::io;
use std::path::Path;

/// Writes `contents` to `path` by first writing to a sibling temp file and
/// renaming it into place, so concurrent readers never observe a torn write
/// (§5: "the user document and cached remote config files are written via
/// write-temp-then-rename").
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let tmp_path = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("nrdot")
    ));
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

/// Recursively deletes a directory if it exists, swallowing "not found"
/// errors so cleanup code can call this unconditionally.
pub fn remove_dir_best_effort(path: &Path) {
    if let Err(err) = fs::remove_dir_all(path) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove working directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_creates_file_with_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        write_atomic(&path, b"hello: world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello: world");
    }

    #[test]
    fn write_atomic_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        write_atomic(&path, b"data").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn remove_dir_best_effort_is_noop_for_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        remove_dir_best_effort(&missing);
    }
}

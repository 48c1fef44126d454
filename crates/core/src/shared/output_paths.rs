use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::constants::VIDEO_EXTENSION;

/// Returns `dir/<prefix>_<unix seconds>.mp4`, creating `dir` if needed.
///
/// Two outputs requested within the same second get a `_<n>` suffix instead
/// of overwriting each other.
pub fn timestamped(dir: &Path, prefix: &str) -> io::Result<PathBuf> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    timestamped_at(dir, prefix, seconds)
}

fn timestamped_at(dir: &Path, prefix: &str, seconds: u64) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let base = dir.join(format!("{prefix}_{seconds}.{VIDEO_EXTENSION}"));
    if !base.exists() {
        return Ok(base);
    }

    let mut n = 1usize;
    loop {
        let candidate = dir.join(format!("{prefix}_{seconds}_{n}.{VIDEO_EXTENSION}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let path = timestamped(&dir, "recorded").unwrap();
        assert!(dir.is_dir());
        assert_eq!(path.parent().unwrap(), dir);
    }

    #[test]
    fn test_name_format() {
        let tmp = TempDir::new().unwrap();
        let path = timestamped_at(tmp.path(), "faceswap", 1_700_000_000).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "faceswap_1700000000.mp4"
        );
    }

    #[test]
    fn test_existing_file_gets_suffix() {
        let tmp = TempDir::new().unwrap();
        let first = timestamped_at(tmp.path(), "recorded", 42).unwrap();
        fs::write(&first, b"x").unwrap();
        let second = timestamped_at(tmp.path(), "recorded", 42).unwrap();
        fs::write(&second, b"x").unwrap();
        let third = timestamped_at(tmp.path(), "recorded", 42).unwrap();

        assert_eq!(second.file_name().unwrap(), "recorded_42_1.mp4");
        assert_eq!(third.file_name().unwrap(), "recorded_42_2.mp4");
    }
}

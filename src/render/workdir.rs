use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Per-job scratch directory, removed when dropped unless kept
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    /// `work/slidecast-YYYYMMDD-HHMMSS` relative to the current directory
    pub fn default_path() -> PathBuf {
        PathBuf::from("work").join(format!("slidecast-{}", Local::now().format("%Y%m%d-%H%M%S")))
    }

    /// Create the directory (and any parents)
    pub fn create<P: Into<PathBuf>>(path: P, keep: bool) -> Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;
        debug!("Created working directory {}", path.display());
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.path.join(name)
    }

    pub fn keep(&mut self) {
        self.keep = true;
    }

    pub fn cleanup(&mut self) {
        if self.keep || !self.path.exists() {
            return;
        }

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed working directory {}", self.path.display()),
            Err(e) => warn!("Failed to remove working directory {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            info!("Keeping working directory {}", self.path.display());
        }
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_removed_on_drop() {
        let root = tempdir().unwrap();
        let path = root.path().join("job");

        {
            let work = WorkDir::create(&path, false).unwrap();
            std::fs::write(work.join("slide-1.png"), b"png").unwrap();
            assert!(path.exists());
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_kept_when_requested() {
        let root = tempdir().unwrap();
        let path = root.path().join("nested").join("job");

        drop(WorkDir::create(&path, true).unwrap());
        assert!(path.exists());

        let mut work = WorkDir::create(root.path().join("later"), false).unwrap();
        work.keep();
        let kept = work.path().to_path_buf();
        drop(work);
        assert!(kept.exists());
    }

    #[test]
    fn test_removed_on_error_path() {
        fn failing_job(path: &Path) -> Result<()> {
            let work = WorkDir::create(path, false)?;
            std::fs::write(work.join("concat.txt"), "file 'x'\n")?;
            Err(crate::error::SlidecastError::generic("encoder crashed"))
        }

        let root = tempdir().unwrap();
        let path = root.path().join("job");
        assert!(failing_job(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_default_path_format() {
        let path = WorkDir::default_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(path.starts_with("work"));
        assert!(name.starts_with("slidecast-"));
        assert_eq!(name.len(), "slidecast-YYYYMMDD-HHMMSS".len());
    }
}

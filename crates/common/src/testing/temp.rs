//! Temporary file and directory helpers
//!
//! RAII wrappers that clean up when dropped.

#![allow(clippy::missing_errors_doc)]

use std::path::{Path, PathBuf};
use std::{fs, io};

/// Temporary directory that is automatically deleted when dropped
///
/// # Examples
///
/// ```
/// use leadsync_common::testing::temp::TempDir;
///
/// let temp_dir = TempDir::new("test-dir").unwrap();
/// assert!(temp_dir.path().exists());
/// ```
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create a new temporary directory with a prefix
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir_name = format!("{}-{}", prefix, uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(dir_name);

        fs::create_dir_all(&path)?;

        Ok(Self { path })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file in the temporary directory
    pub fn create_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let file_path = self.path.join(name);
        fs::write(&file_path, contents)?;
        Ok(file_path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

/// Path to a fresh SQLite file inside its own temporary directory.
///
/// The directory (with WAL/SHM side files) is removed on drop.
#[derive(Debug)]
pub struct TempDatabase {
    dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    /// Reserve a database path; the file itself is created by SQLite.
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir = TempDir::new(prefix)?;
        let path = dir.path().join("leadsync.db");
        Ok(Self { dir, path })
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the database
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

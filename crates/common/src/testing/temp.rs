//! Temporary directory helper

use std::path::{Path, PathBuf};
use std::{fs, io};

/// Temporary directory removed on drop.
///
/// ```
/// use encore_common::testing::temp::TempDir;
///
/// let dir = TempDir::new("uploads").unwrap();
/// assert!(dir.path().exists());
/// ```
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create `<tmp>/<prefix>-<uuid>`.
    pub fn new(prefix: &str) -> io::Result<Self> {
        let path = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `name` inside the directory.
    pub fn create_file(&self, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let file_path = self.path.join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, contents)?;
        Ok(file_path)
    }

    /// Keep the directory on disk and return its path.
    pub fn keep(mut self) -> PathBuf {
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if !self.path.as_os_str().is_empty() && self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_on_drop() {
        let path = {
            let dir = TempDir::new("encore-temp").unwrap();
            dir.create_file("nested/file.txt", b"hello").unwrap();
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn keep_leaves_directory() {
        let dir = TempDir::new("encore-keep").unwrap();
        let path = dir.keep();
        assert!(path.exists());
        fs::remove_dir_all(&path).unwrap();
    }
}

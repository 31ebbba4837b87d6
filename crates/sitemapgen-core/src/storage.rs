//! File persistence for generated sitemaps and robots files.
//!
//! The session never touches the file system directly; it hands every payload
//! to a [`FileStore`]. [`LocalFileStore`] writes into an output directory,
//! [`MemoryFileStore`] keeps everything in memory for tests and dry runs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Write-once-per-name file sink used by a session.
///
/// Names are bare filenames relative to the store root.
pub trait FileStore {
    /// Create or replace `name` with `contents`.
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<()>;

    /// Read `name` as UTF-8 text.
    fn read_to_string(&self, name: &str) -> Result<String>;

    /// Whether `name` exists.
    fn exists(&self, name: &str) -> bool;

    /// Size of `name` in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;
}

/// Stores files in a directory on the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root_dir: PathBuf,
}

impl LocalFileStore {
    /// Open `root_dir`, creating it if missing.
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        fs::create_dir_all(&root_dir).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("Failed to create output directory {}: {e}", root_dir.display()),
            ))
        })?;
        Ok(Self { root_dir })
    }

    /// Returns the output directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Full path of `name` inside the output directory.
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root_dir.join(name)
    }
}

impl FileStore for LocalFileStore {
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.path_of(name);
        let tmp_path = self.path_of(&format!(".{name}.tmp"));
        fs::write(&tmp_path, contents)?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)?;
        }

        fs::rename(&tmp_path, &path)?;
        debug!(file = %path.display(), bytes = contents.len(), "Wrote file");
        Ok(())
    }

    fn read_to_string(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.path_of(name))?)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        Ok(fs::metadata(self.path_of(name))?.len())
    }
}

/// Keeps written files in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFileStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of `name`, if written.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    /// Names of all stored files, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of stored files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn not_found(name: &str) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{name} has not been written"),
    ))
}

impl FileStore for MemoryFileStore {
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        self.files.insert(name.to_string(), contents.to_vec());
        Ok(())
    }

    fn read_to_string(&self, name: &str) -> Result<String> {
        let bytes = self.get(name).ok_or_else(|| not_found(name))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        self.get(name)
            .map(|b| crate::numeric::usize_to_u64(b.len()))
            .ok_or_else(|| not_found(name))
    }
}

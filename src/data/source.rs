//! Dataset sources and their fingerprints

use crate::core::{ClassifyError, DataSource, Fingerprint, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Dataset stored in a file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn not_found(&self, reason: impl std::fmt::Display) -> ClassifyError {
        ClassifyError::ResourceNotFound(format!("{}: {reason}", self.path.display()))
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    /// SHA-256 of the file contents, streamed.
    ///
    /// Equal bytes give equal keys wherever the file lives, and any edit
    /// gives a new key even when size and mtime are unchanged. A cache hit
    /// still reads the file once to hash it but skips parsing and encoding.
    fn fingerprint(&self) -> Result<Fingerprint> {
        let metadata = fs::metadata(&self.path).map_err(|e| self.not_found(e))?;
        if !metadata.is_file() {
            return Err(self.not_found("not a regular file"));
        }

        let mut file = File::open(&self.path).map_err(|e| self.not_found(e))?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(|e| self.not_found(e))?;
        Ok(Fingerprint::new(format!("{:x}", hasher.finalize())))
    }

    fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| self.not_found(e))
    }
}

/// Dataset held in memory, fingerprinted by content
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: String,
    contents: Vec<u8>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

impl DataSource for InMemorySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(content_fingerprint(&self.contents))
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.contents.clone())
    }
}

/// SHA-256 of raw bytes
pub fn content_fingerprint(bytes: &[u8]) -> Fingerprint {
    Fingerprint::new(format!("{:x}", Sha256::digest(bytes)))
}

//! Resolution patch stores.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::traits::PatchStore;

/// A pre-resolved unified diff for one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPatch {
    /// Store key: the full hash of the commit it resolves.
    pub id: String,
    /// Where the patch was loaded from, for diagnostics.
    pub origin: String,
    /// Raw patch bytes.
    pub contents: Vec<u8>,
}

/// Patches stored as flat files named by commit hash.
#[derive(Debug, Clone)]
pub struct DirPatchStore {
    root: PathBuf,
}

impl DirPatchStore {
    /// Create a store rooted at `root`. The directory need not exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory patches are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PatchStore for DirPatchStore {
    fn lookup(&self, key: &str) -> Result<Option<ResolutionPatch>> {
        // Keys are commit hashes; anything path-like cannot match a file name.
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Ok(None);
        }

        let path = self.root.join(key);
        match fs::read(&path) {
            Ok(contents) => Ok(Some(ResolutionPatch {
                id: key.to_string(),
                origin: path.display().to_string(),
                contents,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::PatchStore {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatchStore {
    patches: HashMap<String, Vec<u8>>,
}

impl MemoryPatchStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a patch under `key`, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.patches.insert(key.into(), contents.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_patch(mut self, key: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(key, contents);
        self
    }
}

impl PatchStore for MemoryPatchStore {
    fn lookup(&self, key: &str) -> Result<Option<ResolutionPatch>> {
        Ok(self.patches.get(key).map(|contents| ResolutionPatch {
            id: key.to_string(),
            origin: format!("memory:{key}"),
            contents: contents.clone(),
        }))
    }
}

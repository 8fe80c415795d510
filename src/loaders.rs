//! Resource loading utilities
//!
//! Reads description documents from disk under the configured limits and
//! hands them to the parser.

use std::fs;
use std::path::Path;

use crate::documents::ElementTree;
use crate::error::{Error, Result};
use crate::limits::Limits;

/// Resource loader for description documents
#[derive(Debug, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Load a file as bytes
    pub fn load_bytes(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();

        // Reject oversized files before reading them
        if let Ok(metadata) = fs::metadata(path) {
            self.limits.check_size(metadata.len() as usize)?;
        }

        let content = fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        self.limits.check_size(content.len())?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Loaded document");
        Ok(content)
    }

    /// Load a file as text
    pub fn load(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let bytes = self.load_bytes(path)?;
        String::from_utf8(bytes).map_err(|e| {
            Error::Resource(format!("File '{}' is not valid UTF-8: {}", path.display(), e))
        })
    }

    /// Load and parse a description document
    pub fn load_tree(&self, path: impl AsRef<Path>) -> Result<ElementTree> {
        let bytes = self.load_bytes(path)?;
        ElementTree::parse_with_limits(&bytes, &self.limits)
    }
}

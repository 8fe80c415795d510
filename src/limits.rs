//! Limits and constraints for document processing
//!
//! This module defines limits applied while loading and parsing description
//! documents, so that hostile or runaway input fails early instead of
//! exhausting memory or the stack of the recursive validator.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_depth: usize,

    /// Maximum document size in bytes
    pub max_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,

    /// Maximum number of elements in one document
    pub max_elements: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB
            max_attributes: 256,
            max_elements: 1_000_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 64,
            max_size: 4 * 1024 * 1024, // 4 MB
            max_attributes: 32,
            max_elements: 50_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_depth: 4096,
            max_size: 1024 * 1024 * 1024, // 1 GB
            max_attributes: 4096,
            max_elements: 100_000_000,
        }
    }

    /// Check if nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "element depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if document size is within limits
    pub fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_size {
            Err(Error::LimitExceeded(format!(
                "document size {} bytes exceeds maximum {} bytes",
                size, self.max_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of elements is within limits
    pub fn check_elements(&self, count: usize) -> Result<()> {
        if count > self.max_elements {
            Err(Error::LimitExceeded(format!(
                "element count {} exceeds maximum {}",
                count, self.max_elements
            )))
        } else {
            Ok(())
        }
    }
}

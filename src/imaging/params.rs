//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. The
//! [`operations`](super::operations) module builds them from config and hands
//! them to a [`backend`](super::backend), which does the pixel work. Tests
//! swap in a recording mock without touching operation logic.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Parameters for a cover operation: fill-resize, center crop, JPEG encode.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverParams {
    pub output: PathBuf,
    /// Exact output dimensions.
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two things the authoring flow needs
//! from an uploaded cover: check that it decodes (identify) and turn it into
//! the stored fixed-size JPEG (cover).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure Rust codecs.

use super::params::CoverParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Inputs are encoded bytes straight from an upload; nothing is staged on disk
/// before the final write.
pub trait ImageBackend: Send + Sync {
    /// Decode enough of the image to report its dimensions.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Fill-resize and center-crop to the exact target size, then write a JPEG.
    fn cover(&self, source: &[u8], params: &CoverParams) -> Result<Dimensions, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and can sit behind an `Arc`.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, every operation fails with this message.
        pub fail_with: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(usize),
        Cover {
            source_len: usize,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn check_failure(&self) -> Result<(), BackendError> {
            match &self.fail_with {
                Some(msg) => Err(BackendError::ProcessingFailed(msg.clone())),
                None => Ok(()),
            }
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(source.len()));
            self.check_failure()?;

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn cover(&self, source: &[u8], params: &CoverParams) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Cover {
                source_len: source.len(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            self.check_failure()?;

            // Leave a file behind so callers that check for the output see one.
            std::fs::write(&params.output, b"mock-jpeg")?;
            Ok(Dimensions {
                width: params.width,
                height: params.height,
            })
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(b"abc").unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify(3)]);
    }

    #[test]
    fn mock_records_cover() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("dune.jpg");
        let backend = MockBackend::new();

        backend
            .cover(
                b"bytes",
                &CoverParams {
                    output: output.clone(),
                    width: 400,
                    height: 600,
                    quality: Quality::new(85),
                },
            )
            .unwrap();

        assert!(output.exists());
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Cover {
                source_len: 5,
                width: 400,
                height: 600,
                quality: 85,
                ..
            }
        ));
    }

    #[test]
    fn failing_mock_errors() {
        let backend = MockBackend::failing("boom");
        let err = backend.identify(b"x").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}

//! High-level image operations.
//!
//! These functions take configuration, compute parameters, and call the
//! backend. File placement decisions (which directory, which stale files to
//! remove) belong to the [`store`](crate::store).

use super::backend::{BackendError, ImageBackend};
use super::params::{CoverParams, Quality};
use crate::config::CoversConfig;
use std::fs;
use std::path::Path;
use tracing::info;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &dyn ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Build the cover parameters for an output path from config.
pub fn cover_params(output: &Path, config: &CoversConfig) -> CoverParams {
    CoverParams {
        output: output.to_path_buf(),
        width: config.width,
        height: config.height,
        quality: Quality::new(u32::from(config.quality)),
    }
}

/// Re-encode an uploaded cover to the configured fixed size at `output`.
///
/// The upload is identified first so an undecodable file fails before the
/// output directory is touched.
pub fn create_cover(
    backend: &dyn ImageBackend,
    source: &[u8],
    output: &Path,
    config: &CoversConfig,
) -> Result<()> {
    let (src_w, src_h) = get_dimensions(backend, source)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let params = cover_params(output, config);
    backend.cover(source, &params)?;
    info!(
        output = %output.display(),
        from = %format!("{src_w}x{src_h}"),
        to = %format!("{}x{}", params.width, params.height),
        "wrote cover"
    );
    Ok(())
}

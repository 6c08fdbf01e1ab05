//! Browser binary discovery.
//!
//! The sidecar drives a headless browser; deployments differ in where that
//! binary lives, so the candidate paths are probed in configured order.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Return the first candidate that exists as a file, in order.
pub fn discover_chrome(candidates: &[String]) -> Option<PathBuf> {
    for candidate in candidates {
        let path = Path::new(candidate);
        if path.is_file() {
            debug!("using browser binary: {}", path.display());
            return Some(path.to_path_buf());
        }
    }
    warn!("no browser binary found among {} candidates", candidates.len());
    None
}

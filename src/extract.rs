//! # Component Extraction
//!
//! Batch extraction of connection components out of a configuration
//! document. Extraction is partial-failure tolerant: every requested Id is
//! attempted independently and in input order, so one missing component
//! never suppresses the others, and each failure stays attributable to the
//! Id that caused it.
//!
//! When an output directory is configured, each successfully extracted
//! fragment is additionally written as a standalone backup artifact. An
//! artifact write failure is recorded on its item without discarding the
//! in-memory fragment or aborting the rest of the batch.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// Outcome of one requested Id within an extraction batch.
#[derive(Debug)]
pub struct ExtractItem {
    /// The requested component Id.
    pub id: String,
    /// The detached fragment, or the per-Id failure (`Error::NotFound`).
    pub fragment: Result<Fragment>,
    /// Backup artifact path, when an output directory was configured and
    /// the write succeeded.
    pub artifact: Option<PathBuf>,
    /// Artifact write failure, reported without suppressing the fragment.
    pub artifact_error: Option<Error>,
}

impl ExtractItem {
    /// Whether the component itself was extracted (artifact trouble aside).
    pub fn is_extracted(&self) -> bool {
        self.fragment.is_ok()
    }
}

/// Extract the requested components from `document`, in input order.
///
/// Returns one [`ExtractItem`] per requested Id. Misses are reported as
/// `Error::NotFound` on their item; they never abort the batch. With
/// `output_dir` set, each extracted fragment is also written as a backup
/// artifact named from its Id.
pub fn extract(document: &mut Document, ids: &[String], output_dir: Option<&Path>) -> Vec<ExtractItem> {
    ids.iter()
        .map(|id| {
            let fragment = document.extract_component(id);
            let (artifact, artifact_error) = match (&fragment, output_dir) {
                (Ok(fragment), Some(dir)) => match fragment.write_artifact(dir) {
                    Ok(path) => (Some(path), None),
                    Err(e) => {
                        warn!("backup artifact for '{}' could not be written: {}", id, e);
                        (None, Some(e))
                    }
                },
                _ => (None, None),
            };
            if fragment.is_ok() {
                debug!("extracted component '{}'", id);
            } else {
                warn!("component '{}' not found in document", id);
            }
            ExtractItem {
                id: id.clone(),
                fragment,
                artifact,
                artifact_error,
            }
        })
        .collect()
}

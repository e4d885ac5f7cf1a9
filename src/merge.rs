//! # Component Merge
//!
//! Replace-or-append reconciliation of candidate fragments into a target
//! document, followed by a single atomic save.
//!
//! ## Merge semantics
//!
//! Candidates are processed strictly in input order. Each candidate is
//! deep-copied into the target document; a component whose Id already exists
//! is replaced in place (its position in the collection is preserved), a
//! novel Id is appended as the last component. A candidate that cannot be
//! absorbed (a duplicate Id within the same batch, or a candidate that
//! fails to re-parse) is recorded as a per-fragment failure and the pass
//! continues; previously absorbed fragments are not rolled back.
//!
//! ## Best-effort batch
//!
//! [`merge_and_save`] persists the document even when some fragments failed:
//! the saved document reflects exactly the subset that merged. Callers that
//! need all-or-nothing behavior should merge one fragment per call. Adjacent
//! text runs are consolidated by the document tree as nodes are replaced, so
//! no separate normalization pass is needed before the save.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use log::{info, warn};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// How a candidate fragment landed in the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// An existing component with the same Id was replaced in place.
    Replaced,
    /// No component had this Id; the candidate was appended last.
    Appended,
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeAction::Replaced => write!(f, "replaced"),
            MergeAction::Appended => write!(f, "appended"),
        }
    }
}

/// Outcome of one candidate fragment within a merge batch.
#[derive(Debug)]
pub struct MergeItem {
    /// The candidate's component Id.
    pub id: String,
    /// What happened, or the per-fragment failure (`Error::MergeFragment`).
    pub outcome: Result<MergeAction>,
}

impl MergeItem {
    /// Whether this candidate was absorbed into the document.
    pub fn is_merged(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Apply candidate fragments to `document`, in input order.
///
/// Returns one [`MergeItem`] per candidate. Per-fragment failures never
/// abort the batch and never roll back earlier candidates. A second
/// candidate with an Id already seen in this batch is rejected as ambiguous
/// rather than silently overwriting the first.
pub fn merge(document: &mut Document, fragments: &[Fragment]) -> Vec<MergeItem> {
    let mut seen: HashSet<String> = HashSet::new();
    fragments
        .iter()
        .map(|fragment| {
            let id = fragment.id().to_string();
            let outcome = if !seen.insert(id.clone()) {
                Err(Error::MergeFragment {
                    id: id.clone(),
                    message: "duplicate candidate in batch".to_string(),
                })
            } else {
                document.absorb_component(fragment)
            };
            match &outcome {
                Ok(action) => info!("component '{}' {}", id, action),
                Err(e) => warn!("{}", e),
            }
            MergeItem { id, outcome }
        })
        .collect()
}

/// Merge candidates into `document`, then persist it to `destination`.
///
/// The save runs even when some fragments failed, so the on-disk document
/// reflects the subset that merged; a save failure is fatal and propagates.
pub fn merge_and_save(
    document: &mut Document,
    fragments: &[Fragment],
    destination: &Path,
) -> Result<Vec<MergeItem>> {
    let items = merge(document, fragments);
    document.save(destination)?;
    Ok(items)
}

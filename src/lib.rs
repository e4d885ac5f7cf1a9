//! # Component Vault Library
//!
//! This library provides the core functionality for backing up and restoring
//! connection components of a privileged-access-management configuration.
//! It is designed to be used by the `component-vault` command-line tool but
//! can also be integrated into other applications that need to manage
//! configuration fragments programmatically.
//!
//! ## Quick Example
//!
//! ```
//! use component_vault::document::Document;
//! use component_vault::{extract, merge};
//!
//! let xml = r#"<Root><ConnectionComponents>
//!     <ConnectionComponent Id="SSH"><ClientApp>ssh</ClientApp></ConnectionComponent>
//!     <ConnectionComponent Id="RDP"><ClientApp>rdp</ClientApp></ConnectionComponent>
//! </ConnectionComponents></Root>"#;
//!
//! // Extract a component as a detached fragment.
//! let mut source = Document::from_str(xml).unwrap();
//! let items = extract::extract(&mut source, &["SSH".to_string()], None);
//! let fragment = items[0].fragment.as_ref().unwrap();
//!
//! // Merge it into another document: replace when the Id exists,
//! // append when it does not.
//! let mut target = Document::from_str(xml).unwrap();
//! let report = merge::merge(&mut target, &[fragment.clone()]);
//! assert!(report[0].is_merged());
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Document (`document`)**: the parsed configuration document, owning
//!   the single `ConnectionComponents` collection; loads fail fast on
//!   malformed markup and saves are atomic.
//! - **Fragment (`fragment`)**: one connection component detached from any
//!   document, with value semantics; also the unit of the standalone
//!   `_<Id>.xml` backup artifact.
//! - **Extraction (`extract`)**: partial-failure-tolerant batch extraction;
//!   each requested Id succeeds or fails independently, in input order.
//! - **Merge (`merge`)**: replace-or-append reconciliation of candidate
//!   fragments into a target document, followed by a single atomic save;
//!   per-fragment failures never roll back the rest of the batch.
//! - **Transport (`transport`, `vault`)**: the fetch/store boundary to the
//!   remote vault, with guaranteed cleanup of local working copies; the
//!   concrete implementation shells out to the vault helper CLI.
//! - **Glue (`config`, `credentials`, `watcher`)**: connection profiles and
//!   parameter files, credential-provider lookup, and parameter-file
//!   polling for operator-driven runs.
//!
//! ## Execution Flow
//!
//! A backup run loads the document (locally or via a transport fetch),
//! extracts each requested component as a detached fragment, and writes one
//! backup artifact per component. A restore run gathers candidate fragments
//! (from artifacts or extraction output), merges them into the target
//! document, saves atomically, and stores the document back through the
//! transport when one is in play. Per-item failures are reported alongside
//! successes in both directions; only document parsing, transport, and save
//! failures abort a run.

pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod extract;
pub mod fragment;
pub mod merge;
pub mod output;
pub mod transport;
pub mod vault;
pub mod watcher;

//! # Vault Transport Boundary
//!
//! The engine never talks a vault protocol itself. It sees the remote store
//! only through the [`Transport`] trait: fetch a named file out of a named
//! container into a local working copy, and store a local file back.
//! Container addressing, authentication, and locking are entirely the
//! transport implementation's concern.
//!
//! ## Working-copy lifetime
//!
//! [`Transport::fetch`] hands back a [`WorkingCopy`] that owns the fetched
//! local file and deletes it on drop. This makes cleanup unconditional on
//! every exit path: a store failure, a merge failure, or an early `?` all
//! release the local copy. A stray temporary file is a bug, not an
//! acceptable outcome.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::Result;

/// Well-known default container holding the configuration document.
pub const DEFAULT_CONTAINER: &str = "PVWAConfig";

/// Default name of the configuration document inside the container.
pub const DEFAULT_DOCUMENT_FILE: &str = "PVConfiguration.xml";

/// Opaque vault credentials.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Credentials {
            user: user.into(),
            secret: secret.into(),
        }
    }
}

// The secret must never reach logs or error output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A fetched local copy of the remote document, deleted on drop.
#[derive(Debug)]
pub struct WorkingCopy {
    path: PathBuf,
}

impl WorkingCopy {
    pub fn new(path: PathBuf) -> Self {
        WorkingCopy { path }
    }

    /// Local path of the working copy.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(
                    "failed to remove working copy '{}': {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Fetch/store access to the remote document store.
pub trait Transport {
    /// Fetch `file_name` out of `container` into a local working copy.
    fn fetch(&self, container: &str, file_name: &str) -> Result<WorkingCopy>;

    /// Store the local file back as `file_name` in `container`.
    ///
    /// Callers only invoke this after a successful [`fetch`](Self::fetch)
    /// (or an initial local load); there is no blind store.
    fn store(&self, container: &str, file_name: &str, local: &Path) -> Result<()>;
}

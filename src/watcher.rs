//! # Parameter-File Watcher
//!
//! Polls a directory until a file matching a glob pattern appears. Used to
//! pick up parameter files dropped by an operator or another system: the
//! command is started first, the parameter file lands later, and the watcher
//! bridges the gap. No filesystem notification API: plain polling keeps
//! this portable across the network shares these files typically land on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use glob::Pattern;
use log::debug;

use crate::error::{Error, Result};

/// Polling cadence and deadline.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Delay between directory scans.
    pub interval: Duration,
    /// Total time to wait before giving up.
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Wait until a file whose name matches `pattern` exists in `dir`.
///
/// Scans immediately, then keeps polling until the deadline. When several
/// files match in one scan, the lexicographically first wins, so repeated
/// runs see a deterministic pick. A directory that does not exist yet is
/// treated as empty, since it may be created while we wait.
///
/// # Errors
///
/// `Error::WatchTimeout` when the deadline passes; `Error::Glob` for an
/// invalid pattern; `Error::Io` for unreadable directories.
pub fn wait_for_file(dir: &Path, pattern: &str, options: &WatchOptions) -> Result<PathBuf> {
    let matcher = Pattern::new(pattern)?;
    let deadline = Instant::now() + options.timeout;

    loop {
        if let Some(found) = scan(dir, &matcher)? {
            debug!("parameter file appeared: '{}'", found.display());
            return Ok(found);
        }
        if Instant::now() >= deadline {
            return Err(Error::WatchTimeout {
                pattern: pattern.to_string(),
                dir: dir.to_path_buf(),
            });
        }
        thread::sleep(options.interval);
    }
}

fn scan(dir: &Path, matcher: &Pattern) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name_matches = path
            .file_name()
            .map(|name| matcher.matches(&name.to_string_lossy()))
            .unwrap_or(false);
        if name_matches {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

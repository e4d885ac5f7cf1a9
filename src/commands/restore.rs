//! Restore command implementation
//!
//! Merges candidate connection components, read from backup artifacts or
//! named by Id, into a configuration document, replacing components whose
//! Id already exists (in place) and appending new ones. The document is
//! saved even when some candidates fail, so the result reflects exactly the
//! subset that merged; in vault mode the saved document is then stored back
//! and the local working copy is removed either way.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use component_vault::document::Document;
use component_vault::error::Error;
use component_vault::fragment::{self, Fragment};
use component_vault::merge;
use component_vault::output::{emoji, OutputConfig};

use super::session::{self, Session};

/// Arguments for the restore command
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Component Ids or backup artifact paths to restore
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,

    #[command(flatten)]
    pub connection: session::ConnectionArgs,

    /// Directory holding backup artifacts for Id sources
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub input: PathBuf,

    /// Replace existing components without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the restore command
pub fn execute(args: RestoreArgs, out: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();

    let resolved = session::resolve(&args.connection, args.quiet)?;

    let mut sources = args.sources.clone();
    if sources.is_empty() {
        sources = resolved.param_components.clone();
    }
    if sources.is_empty() {
        bail!("No restore sources given (arguments or parameter file)");
    }

    // Load candidates up front; a malformed artifact is a per-source
    // failure, not a reason to drop the rest.
    let mut fragments: Vec<Fragment> = Vec::new();
    let mut load_failures: Vec<(String, Error)> = Vec::new();
    for source in &sources {
        let path = resolve_source_path(source, &args.input);
        match Fragment::from_file(&path) {
            Ok(fragment) => fragments.push(fragment),
            Err(e) => load_failures.push((source.clone(), e)),
        }
    }

    let session = Session::open(&resolved)?;
    if !args.quiet && args.verbose {
        println!(
            "{} Loading document: {}",
            emoji(out, "📄", "[DOC]"),
            session.document_path().display()
        );
    }
    let mut document = Document::load(session.document_path())?;

    let replaced: Vec<&str> = fragments
        .iter()
        .filter(|fragment| document.contains(fragment.id()))
        .map(Fragment::id)
        .collect();
    if !replaced.is_empty() && !args.force && !args.quiet && console::user_attended() {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Replace {} existing component(s) ({})?",
                replaced.len(),
                replaced.join(", ")
            ))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("Aborted; document left unchanged.");
            return Ok(());
        }
    }

    let items = merge::merge_and_save(&mut document, &fragments, session.document_path())?;
    session.store_back()?;

    let mut failures = load_failures.len();
    if !args.quiet {
        for (source, e) in &load_failures {
            println!("{} {}: {}", emoji(out, "❌", "[FAIL]"), source, e);
        }
    }
    for item in &items {
        match &item.outcome {
            Ok(action) => {
                if !args.quiet {
                    println!("{} {} {}", emoji(out, "✅", "[OK]"), item.id, action);
                }
            }
            Err(e) => {
                failures += 1;
                if !args.quiet {
                    println!("{} {}", emoji(out, "❌", "[FAIL]"), e);
                }
            }
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} components could not be restored",
            failures,
            sources.len()
        );
    }

    if !args.quiet {
        println!(
            "{} Restored {} components in {:.2}s",
            emoji(out, "✅", "[DONE]"),
            items.len(),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

/// Resolve one SOURCE argument: an existing path or anything path-shaped is
/// used as an artifact file; a bare Id is looked up as `_<Id>.xml` under
/// the input directory.
fn resolve_source_path(source: &str, input_dir: &Path) -> PathBuf {
    let candidate = Path::new(source);
    if candidate.exists()
        || source.ends_with(".xml")
        || source.contains(std::path::MAIN_SEPARATOR)
    {
        candidate.to_path_buf()
    } else {
        input_dir.join(fragment::artifact_file_name(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_source_path_bare_id() {
        let path = resolve_source_path("PSM-SSH", Path::new("/backups"));
        assert_eq!(path, Path::new("/backups/_PSM-SSH.xml"));
    }

    #[test]
    fn test_resolve_source_path_xml_suffix_is_a_path() {
        let path = resolve_source_path("exported.xml", Path::new("/backups"));
        assert_eq!(path, Path::new("exported.xml"));
    }

    #[test]
    fn test_resolve_source_path_existing_file_wins() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("SSH");
        fs::write(&existing, "<x/>").unwrap();

        let source = existing.to_string_lossy().into_owned();
        let path = resolve_source_path(&source, Path::new("/backups"));
        assert_eq!(path, existing);
    }
}

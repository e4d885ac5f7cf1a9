//! Backup command implementation
//!
//! Extracts the requested connection components from a configuration
//! document (local or fetched from the vault) and writes one backup
//! artifact per component into the output directory. Ids are processed
//! independently and in order: a missing component is reported for its Id
//! and never stops the others.

use std::time::Instant;

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use component_vault::document::Document;
use component_vault::extract;
use component_vault::output::{emoji, OutputConfig};

use super::session::{self, Session};

/// Arguments for the backup command
#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Component Ids to back up (may also come from the parameter file)
    #[arg(value_name = "ID")]
    pub components: Vec<String>,

    #[command(flatten)]
    pub connection: session::ConnectionArgs,

    /// Directory for backup artifacts
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the backup command
pub fn execute(args: BackupArgs, out: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();

    let resolved = session::resolve(&args.connection, args.quiet)?;

    let mut ids = args.components.clone();
    if ids.is_empty() {
        ids = resolved.param_components.clone();
    }
    dedupe_in_order(&mut ids);
    if ids.is_empty() {
        bail!("No component Ids given (arguments or parameter file)");
    }
    if !args.output.is_dir() {
        bail!("Output directory not found: {}", args.output.display());
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

    let items = extract::extract(&mut document, &ids, Some(&args.output));

    let mut failures = 0;
    for item in &items {
        match (&item.fragment, &item.artifact, &item.artifact_error) {
            (Ok(_), Some(path), _) => {
                if !args.quiet {
                    println!(
                        "{} {} -> {}",
                        emoji(out, "✅", "[OK]"),
                        item.id,
                        path.display()
                    );
                }
            }
            (Ok(_), None, Some(e)) => {
                // Extracted but not persisted: still a failed backup.
                failures += 1;
                if !args.quiet {
                    println!("{} {}: {}", emoji(out, "⚠️", "[WARN]"), item.id, e);
                }
            }
            (Ok(_), None, None) => {}
            (Err(e), _, _) => {
                failures += 1;
                if !args.quiet {
                    println!("{} {}", emoji(out, "❌", "[FAIL]"), e);
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} components could not be backed up", failures, items.len());
    }

    if !args.quiet {
        println!(
            "{} Backed up {} components in {:.2}s",
            emoji(out, "✅", "[DONE]"),
            items.len(),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

/// Drop repeated Ids, keeping the first occurrence's position.
fn dedupe_in_order(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

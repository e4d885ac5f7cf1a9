//! Shared connection plumbing for the backup and restore commands
//!
//! Resolves where the configuration document comes from (a local path or a
//! vault fetch) by layering CLI flags over an optional parameter file over
//! an optional connection profile, and owns the document's lifetime: in
//! vault mode the fetched working copy is deleted when the session drops,
//! whatever happened in between.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::ProgressBar;

use component_vault::config::{self, Parameters, Profile};
use component_vault::credentials;
use component_vault::transport::{
    Credentials, Transport, WorkingCopy, DEFAULT_CONTAINER, DEFAULT_DOCUMENT_FILE,
};
use component_vault::vault::{VaultCliTransport, DEFAULT_VAULT_CLI};
use component_vault::watcher::{self, WatchOptions};

/// Document-source and vault-connection options shared by backup and
/// restore. `--document` and the vault triple are mutually exclusive input
/// modes.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Path to a local configuration document
    #[arg(short, long, value_name = "PATH", conflicts_with = "address")]
    pub document: Option<PathBuf>,

    /// Vault address (remote mode)
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Vault user name
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Vault container holding the configuration document
    #[arg(long, value_name = "NAME")]
    pub container: Option<String>,

    /// File name of the document inside the container
    #[arg(long, value_name = "NAME")]
    pub file: Option<String>,

    /// Path to the vault helper CLI
    #[arg(long, value_name = "PATH", env = "COMPONENT_VAULT_CLI")]
    pub vault_cli: Option<PathBuf>,

    /// Environment variable holding the vault password
    #[arg(long, value_name = "VAR", default_value = "COMPONENT_VAULT_PASSWORD")]
    pub password_env: String,

    /// Credential provider endpoint for password retrieval
    #[arg(long, value_name = "URL")]
    pub password_url: Option<String>,

    /// Application id presented to the credential provider
    #[arg(long, value_name = "ID")]
    pub app_id: Option<String>,

    /// Connection profile file
    #[arg(short, long, value_name = "PATH", env = "COMPONENT_VAULT_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Parameter file (or glob) with component Ids and connection settings
    #[arg(long, value_name = "PATH")]
    pub param_file: Option<PathBuf>,

    /// Seconds to wait for the parameter file to appear
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub wait: u64,
}

/// Connection settings after layering flags > parameter file > profile.
#[derive(Debug)]
pub struct ResolvedConnection {
    pub document: Option<PathBuf>,
    pub profile: Profile,
    /// Component Ids/sources named by the parameter file, if any.
    pub param_components: Vec<String>,
    pub password_env: String,
}

/// Resolve the effective connection settings for a command run.
pub fn resolve(args: &ConnectionArgs, quiet: bool) -> Result<ResolvedConnection> {
    let parameters = match &args.param_file {
        Some(path) => Some(load_parameters(path, args.wait, quiet)?),
        None => None,
    };
    let file_profile = match &args.profile {
        Some(path) => Some(config::profile_from_file(path)?),
        None => config::load_default_profile()?,
    };

    let mut profile = Profile {
        address: args.address.clone(),
        user: args.user.clone(),
        container: args.container.clone(),
        document_file: args.file.clone(),
        vault_cli: args.vault_cli.clone(),
        password_url: args.password_url.clone(),
        app_id: args.app_id.clone(),
    };
    if let Some(parameters) = &parameters {
        profile = profile.merged_over(parameters.profile.clone());
    }
    if let Some(base) = file_profile {
        profile = profile.merged_over(base);
    }

    Ok(ResolvedConnection {
        document: args.document.clone(),
        profile,
        param_components: parameters.map(|p| p.components).unwrap_or_default(),
        password_env: args.password_env.clone(),
    })
}

/// Read the parameter file, polling for it first when `--wait` is set.
fn load_parameters(path: &Path, wait_secs: u64, quiet: bool) -> Result<Parameters> {
    if path.exists() {
        return Ok(config::parameters_from_file(path)?);
    }
    if wait_secs == 0 {
        bail!("Parameter file not found: {}", path.display());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let pattern = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "*".to_string());

    let spinner = if !quiet && console::user_attended() {
        let bar = ProgressBar::new_spinner();
        bar.set_message(format!("Waiting for parameter file '{}'...", pattern));
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    } else {
        None
    };

    let options = WatchOptions {
        timeout: Duration::from_secs(wait_secs),
        ..WatchOptions::default()
    };
    let found = watcher::wait_for_file(&dir, &pattern, &options);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    Ok(config::parameters_from_file(&found?)?)
}

/// An open document source. In vault mode the fetched working copy lives
/// exactly as long as the session.
#[derive(Debug)]
pub enum Session {
    Local {
        path: PathBuf,
    },
    Vault {
        transport: VaultCliTransport,
        container: String,
        file_name: String,
        copy: WorkingCopy,
    },
}

impl Session {
    /// Acquire the document: validate the local path, or fetch the document
    /// out of the vault into a working copy.
    pub fn open(resolved: &ResolvedConnection) -> Result<Session> {
        if let Some(path) = &resolved.document {
            if !path.exists() {
                bail!("Configuration document not found: {}", path.display());
            }
            return Ok(Session::Local { path: path.clone() });
        }

        let profile = &resolved.profile;
        let (Some(address), Some(user)) = (profile.address.clone(), profile.user.clone()) else {
            bail!("Either --document or a vault connection (--address and --user) is required");
        };

        let secret = resolve_secret(profile, &user, &resolved.password_env)?;
        let transport = VaultCliTransport::new(
            profile
                .vault_cli
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VAULT_CLI)),
            address,
            Credentials::new(user, secret),
        );
        let container = profile
            .container
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTAINER.to_string());
        let file_name = profile
            .document_file
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_FILE.to_string());

        let copy = transport.fetch(&container, &file_name)?;
        Ok(Session::Vault {
            transport,
            container,
            file_name,
            copy,
        })
    }

    /// Local path of the document for this session.
    pub fn document_path(&self) -> &Path {
        match self {
            Session::Local { path } => path,
            Session::Vault { copy, .. } => copy.path(),
        }
    }

    /// Store the saved document back through the transport; no-op for a
    /// local document.
    pub fn store_back(&self) -> Result<()> {
        if let Session::Vault {
            transport,
            container,
            file_name,
            copy,
        } = self
        {
            transport.store(container, file_name, copy.path())?;
        }
        Ok(())
    }
}

/// Vault password: credential provider when configured, environment
/// variable otherwise.
fn resolve_secret(profile: &Profile, user: &str, password_env: &str) -> Result<String> {
    if let (Some(url), Some(app_id)) = (&profile.password_url, &profile.app_id) {
        return Ok(credentials::fetch_secret(url, app_id, user)?);
    }
    std::env::var(password_env).with_context(|| {
        format!(
            "vault password not available: set {} or configure a credential provider",
            password_env
        )
    })
}

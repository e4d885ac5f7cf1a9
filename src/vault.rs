//! # Vault Helper CLI Transport
//!
//! Concrete [`Transport`] implementation that delegates to an external vault
//! helper CLI, the way the platform's own tooling moves files in and out of
//! the vault. One helper invocation per operation: `retrieve` pulls the
//! document into a local working copy, `store` pushes a local file back.
//! Session handling, container locking, and retries are the helper's
//! business; this adapter only builds the invocation, feeds the secret
//! through the child environment, and maps failures to transport errors.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};
use crate::transport::{Credentials, Transport, WorkingCopy};

/// Default name of the vault helper CLI, resolved via `PATH`.
pub const DEFAULT_VAULT_CLI: &str = "vault-cli";

/// Environment variable through which the secret is passed to the helper.
const SECRET_ENV: &str = "VAULT_CLI_PASSWORD";

/// Transport backed by an external vault helper process.
#[derive(Debug)]
pub struct VaultCliTransport {
    cli_path: PathBuf,
    address: String,
    credentials: Credentials,
}

impl VaultCliTransport {
    pub fn new(cli_path: PathBuf, address: String, credentials: Credentials) -> Self {
        VaultCliTransport {
            cli_path,
            address,
            credentials,
        }
    }

    fn fetch_args(&self, container: &str, file_name: &str, out: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["retrieve"].map(OsString::from).to_vec();
        args.extend(self.connection_args(container));
        args.push("--file".into());
        args.push(file_name.into());
        args.push("--out".into());
        args.push(out.into());
        args
    }

    fn store_args(&self, container: &str, file_name: &str, local: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["store"].map(OsString::from).to_vec();
        args.extend(self.connection_args(container));
        args.push("--file".into());
        args.push(file_name.into());
        args.push("--in".into());
        args.push(local.into());
        args
    }

    fn connection_args(&self, container: &str) -> Vec<OsString> {
        [
            "--address",
            self.address.as_str(),
            "--user",
            self.credentials.user.as_str(),
            "--safe",
            container,
        ]
        .map(OsString::from)
        .to_vec()
    }

    /// Run one helper invocation, mapping any failure to `Error::Transport`.
    fn run(&self, operation: &str, args: &[OsString]) -> Result<()> {
        debug!("vault helper: {} {:?}", self.cli_path.display(), args);
        let output = Command::new(&self.cli_path)
            .args(args)
            .env(SECRET_ENV, &self.credentials.secret)
            .output()
            .map_err(|e| Error::Transport {
                operation: operation.to_string(),
                message: format!("cannot run '{}': {}", self.cli_path.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            // Surface a pointed message for the most common failure class.
            let message = if stderr.contains("authentication")
                || stderr.contains("Authentication")
                || stderr.contains("logon")
            {
                format!(
                    "Authentication failed for user '{}' at '{}'. \
                     Check the password source and that the user may open the container.\n\
                     Error: {}",
                    self.credentials.user, self.address, stderr
                )
            } else {
                stderr.to_string()
            };

            return Err(Error::Transport {
                operation: operation.to_string(),
                message,
            });
        }

        Ok(())
    }

    fn staging_path(file_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "component-vault-{}-{}",
            std::process::id(),
            file_name
        ))
    }
}

impl Transport for VaultCliTransport {
    fn fetch(&self, container: &str, file_name: &str) -> Result<WorkingCopy> {
        let local = Self::staging_path(file_name);
        // Guard first: if the helper fails after partially writing the file,
        // the drop removes whatever landed.
        let copy = WorkingCopy::new(local);
        let args = self.fetch_args(container, file_name, copy.path());
        self.run("fetch", &args)?;
        Ok(copy)
    }

    fn store(&self, container: &str, file_name: &str, local: &Path) -> Result<()> {
        let args = self.store_args(container, file_name, local);
        self.run("store", &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> VaultCliTransport {
        VaultCliTransport::new(
            PathBuf::from("/nonexistent/vault-cli"),
            "vault.example.com:1858".to_string(),
            Credentials::new("backup-operator", "secret"),
        )
    }

    #[test]
    fn test_fetch_args_shape() {
        let t = transport();
        let args = t.fetch_args("PVWAConfig", "PVConfiguration.xml", Path::new("/tmp/copy.xml"));
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(rendered[0], "retrieve");
        assert!(rendered.contains(&"--address".to_string()));
        assert!(rendered.contains(&"vault.example.com:1858".to_string()));
        assert!(rendered.contains(&"--safe".to_string()));
        assert!(rendered.contains(&"PVWAConfig".to_string()));
        assert!(rendered.contains(&"PVConfiguration.xml".to_string()));
        // The secret travels via the environment, never on the command line.
        assert!(!rendered.iter().any(|a| a.contains("secret")));
    }

    #[test]
    fn test_store_args_shape() {
        let t = transport();
        let args = t.store_args("PVWAConfig", "PVConfiguration.xml", Path::new("/tmp/copy.xml"));
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(rendered[0], "store");
        assert!(rendered.contains(&"--in".to_string()));
        assert!(rendered.contains(&"/tmp/copy.xml".to_string()));
    }

    #[test]
    fn test_missing_helper_is_transport_error() {
        let t = transport();
        let result = t.fetch("PVWAConfig", "PVConfiguration.xml");
        match result {
            Err(Error::Transport { operation, message }) => {
                assert_eq!(operation, "fetch");
                assert!(message.contains("vault-cli"));
            }
            other => panic!("expected transport error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_failed_fetch_leaves_no_working_copy() {
        let t = transport();
        let staging = VaultCliTransport::staging_path("PVConfiguration.xml");
        let _ = t.fetch("PVWAConfig", "PVConfiguration.xml");
        assert!(!staging.exists());
    }
}

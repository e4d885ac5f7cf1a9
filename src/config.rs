//! # Connection Profiles and Parameter Files
//!
//! Two YAML inputs feed the CLI besides its flags:
//!
//! - **Profile** (`profile.yaml`): durable connection settings for a vault:
//!   address, user, container, document file name, helper CLI path, and
//!   optionally a credential-provider endpoint. Looked up from an explicit
//!   path, or from the user's config directory by default.
//! - **Parameter file**: a drop-in work order naming the component Ids to
//!   process, optionally overriding connection settings. Parameter files
//!   are what the watcher polls for.
//!
//! Precedence is flags over parameter file over profile; merging happens in
//! the command layer via [`Profile::merged_over`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default profile file name inside the user config directory.
pub const DEFAULT_PROFILE_FILENAME: &str = "profile.yaml";

/// Durable connection settings for one vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Vault address (host:port or URL, transport-defined).
    #[serde(default)]
    pub address: Option<String>,
    /// Vault user name.
    #[serde(default)]
    pub user: Option<String>,
    /// Container holding the configuration document.
    #[serde(default)]
    pub container: Option<String>,
    /// File name of the document inside the container.
    #[serde(default)]
    pub document_file: Option<String>,
    /// Path to the vault helper CLI.
    #[serde(default)]
    pub vault_cli: Option<PathBuf>,
    /// Credential provider endpoint for password retrieval.
    #[serde(default)]
    pub password_url: Option<String>,
    /// Application id presented to the credential provider.
    #[serde(default)]
    pub app_id: Option<String>,
}

impl Profile {
    /// Overlay this profile on top of `base`: fields set here win, unset
    /// fields fall through to `base`.
    pub fn merged_over(self, base: Profile) -> Profile {
        Profile {
            address: self.address.or(base.address),
            user: self.user.or(base.user),
            container: self.container.or(base.container),
            document_file: self.document_file.or(base.document_file),
            vault_cli: self.vault_cli.or(base.vault_cli),
            password_url: self.password_url.or(base.password_url),
            app_id: self.app_id.or(base.app_id),
        }
    }
}

/// A drop-in work order: which components to process, plus optional
/// connection overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameters {
    /// Component Ids (backup) or sources (restore) to process.
    #[serde(default)]
    pub components: Vec<String>,
    /// Connection settings overriding the profile.
    #[serde(flatten)]
    pub profile: Profile,
}

/// Parse a profile file.
pub fn profile_from_file(path: &Path) -> Result<Profile> {
    let text = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("cannot read profile '{}': {}", path.display(), e),
    })?;
    serde_yaml::from_str(&text).map_err(|e| Error::Config {
        message: format!("invalid profile '{}': {}", path.display(), e),
    })
}

/// Parse a parameter file.
pub fn parameters_from_file(path: &Path) -> Result<Parameters> {
    let text = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("cannot read parameter file '{}': {}", path.display(), e),
    })?;
    serde_yaml::from_str(&text).map_err(|e| Error::Config {
        message: format!("invalid parameter file '{}': {}", path.display(), e),
    })
}

/// Default profile location: `<user config dir>/component-vault/profile.yaml`.
pub fn default_profile_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("component-vault").join(DEFAULT_PROFILE_FILENAME))
}

/// Load the default profile if one exists; `None` when the file is absent.
pub fn load_default_profile() -> Result<Option<Profile>> {
    match default_profile_path() {
        Some(path) if path.exists() => profile_from_file(&path).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_profile_parses_all_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profile.yaml");
        fs::write(
            &path,
            r#"
address: vault.example.com:1858
user: backup-operator
container: PVWAConfig
document_file: PVConfiguration.xml
vault_cli: /opt/vault/vault-cli
password_url: https://cp.example.com/api/accounts
app_id: component-backup
"#,
        )
        .unwrap();

        let profile = profile_from_file(&path).unwrap();
        assert_eq!(profile.address.as_deref(), Some("vault.example.com:1858"));
        assert_eq!(profile.user.as_deref(), Some("backup-operator"));
        assert_eq!(profile.container.as_deref(), Some("PVWAConfig"));
        assert_eq!(
            profile.vault_cli.as_deref(),
            Some(Path::new("/opt/vault/vault-cli"))
        );
        assert_eq!(profile.app_id.as_deref(), Some("component-backup"));
    }

    #[test]
    fn test_profile_all_fields_optional() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profile.yaml");
        fs::write(&path, "user: backup-operator\n").unwrap();

        let profile = profile_from_file(&path).unwrap();
        assert_eq!(profile.user.as_deref(), Some("backup-operator"));
        assert!(profile.address.is_none());
    }

    #[test]
    fn test_profile_invalid_yaml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profile.yaml");
        fs::write(&path, "address: [unclosed").unwrap();

        let result = profile_from_file(&path);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_profile_missing_file_is_config_error() {
        let result = profile_from_file(Path::new("/nonexistent/profile.yaml"));
        match result {
            Err(Error::Config { message }) => assert!(message.contains("cannot read")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_merged_over_prefers_overlay() {
        let base = Profile {
            address: Some("old.example.com".to_string()),
            user: Some("base-user".to_string()),
            ..Profile::default()
        };
        let overlay = Profile {
            address: Some("new.example.com".to_string()),
            ..Profile::default()
        };

        let merged = overlay.merged_over(base);
        assert_eq!(merged.address.as_deref(), Some("new.example.com"));
        assert_eq!(merged.user.as_deref(), Some("base-user"));
    }

    #[test]
    fn test_parameters_with_flattened_profile() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("params.yaml");
        fs::write(
            &path,
            r#"
components:
  - PSM-SSH
  - PSM-RDP
container: StagingConfig
"#,
        )
        .unwrap();

        let parameters = parameters_from_file(&path).unwrap();
        assert_eq!(parameters.components, vec!["PSM-SSH", "PSM-RDP"]);
        assert_eq!(parameters.profile.container.as_deref(), Some("StagingConfig"));
    }

    #[test]
    fn test_parameters_components_default_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("params.yaml");
        fs::write(&path, "container: X\n").unwrap();

        let parameters = parameters_from_file(&path).unwrap();
        assert!(parameters.components.is_empty());
    }
}

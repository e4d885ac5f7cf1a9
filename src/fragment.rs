//! # Detached Connection-Component Fragments
//!
//! A [`Fragment`] is one connection component detached from any document: an
//! identity key plus the component's serialized subtree, owned as a value.
//! Fragments come from two places, extraction out of a source
//! [`Document`](crate::document::Document) or a standalone backup artifact
//! file, and are consumed by the merger, which deep-copies them into a
//! target document. Because a fragment owns its serialized form outright,
//! mutating any document it was extracted from or absorbed into never
//! affects it.
//!
//! ## Backup artifacts
//!
//! A backup artifact is exactly one fragment serialized standalone, UTF-8,
//! with no surrounding collection wrapper, named `_<Id>.xml`. Id characters
//! that are unsafe in file names are replaced with `-`.

use std::fs;
use std::path::{Path, PathBuf};

use xot::Xot;

use crate::document::{COMPONENT_ELEMENT, ID_ATTRIBUTE};
use crate::error::{Error, Result};

/// File-name prefix for backup artifacts.
pub const ARTIFACT_PREFIX: &str = "_";

/// File-name extension for backup artifacts.
pub const ARTIFACT_EXTENSION: &str = "xml";

/// One connection component, detached from any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    id: String,
    xml: String,
}

impl Fragment {
    /// Build a fragment from already-validated parts (extraction path).
    pub(crate) fn from_parts(id: String, xml: String) -> Self {
        Fragment { id, xml }
    }

    /// Parse a standalone fragment from its XML text.
    ///
    /// The text must be a well-formed document whose root element is a
    /// `ConnectionComponent` carrying a non-empty `Id` attribute; the
    /// identity key is taken from that attribute.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` for malformed markup, a wrong root element, or
    /// a missing/empty `Id`.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut xot = Xot::new();
        let root = xot.parse(xml).map_err(|e| Error::Parse {
            message: format!("fragment does not parse: {}", e),
        })?;
        let top = xot.document_element(root).map_err(|e| Error::Parse {
            message: e.to_string(),
        })?;

        let component_name = xot.add_name(COMPONENT_ELEMENT);
        let id_name = xot.add_name(ID_ATTRIBUTE);

        let is_component = xot
            .element(top)
            .map(|element| element.name() == component_name)
            .unwrap_or(false);
        if !is_component {
            return Err(Error::Parse {
                message: format!("fragment root element is not <{}>", COMPONENT_ELEMENT),
            });
        }

        let id = xot
            .attributes(top)
            .get(id_name)
            .map(|value| value.to_string())
            .ok_or_else(|| Error::Parse {
                message: format!("fragment is missing the {} attribute", ID_ATTRIBUTE),
            })?;
        if id.is_empty() {
            return Err(Error::Parse {
                message: format!("fragment has an empty {} attribute", ID_ATTRIBUTE),
            });
        }

        Ok(Fragment {
            id,
            xml: xml.to_string(),
        })
    }

    /// Read a fragment from a backup artifact file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// The component identity key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The serialized component subtree.
    pub fn as_xml(&self) -> &str {
        &self.xml
    }

    /// Deterministic artifact file name for this fragment.
    pub fn artifact_file_name(&self) -> String {
        artifact_file_name(&self.id)
    }

    /// Write this fragment as a standalone backup artifact under `dir`.
    ///
    /// Returns the artifact path. The file contains exactly the component
    /// subtree, UTF-8 encoded.
    pub fn write_artifact(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.artifact_file_name());
        fs::write(&path, self.xml.as_bytes())?;
        log::debug!("wrote backup artifact '{}'", path.display());
        Ok(path)
    }
}

/// Deterministic artifact file name for a component Id: `_<Id>.xml`, with
/// file-name-unsafe characters replaced by `-`.
pub fn artifact_file_name(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{}{}.{}", ARTIFACT_PREFIX, safe, ARTIFACT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SSH: &str =
        r#"<ConnectionComponent Id="PSM-SSH"><ClientApp>ssh</ClientApp></ConnectionComponent>"#;

    #[test]
    fn test_from_xml_takes_id_from_attribute() {
        let fragment = Fragment::from_xml(SSH).unwrap();
        assert_eq!(fragment.id(), "PSM-SSH");
        assert_eq!(fragment.as_xml(), SSH);
    }

    #[test]
    fn test_from_xml_rejects_wrong_root_element() {
        let result = Fragment::from_xml(r#"<ConnectionComponents Id="X"/>"#);
        match result {
            Err(Error::Parse { message }) => assert!(message.contains("root element")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_xml_rejects_missing_id() {
        let result = Fragment::from_xml(r#"<ConnectionComponent><ClientApp/></ConnectionComponent>"#);
        match result {
            Err(Error::Parse { message }) => assert!(message.contains("Id")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_xml_rejects_malformed_markup() {
        assert!(matches!(
            Fragment::from_xml("<ConnectionComponent Id='x'>"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_artifact_file_name() {
        let fragment = Fragment::from_xml(SSH).unwrap();
        assert_eq!(fragment.artifact_file_name(), "_PSM-SSH.xml");
    }

    #[test]
    fn test_artifact_file_name_sanitizes_separators() {
        assert_eq!(artifact_file_name("PSM/SSH v2"), "_PSM-SSH-v2.xml");
    }

    #[test]
    fn test_write_artifact_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let fragment = Fragment::from_xml(SSH).unwrap();

        let path = fragment.write_artifact(temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join("_PSM-SSH.xml"));

        let reloaded = Fragment::from_file(&path).unwrap();
        assert_eq!(reloaded, fragment);
    }

    #[test]
    fn test_write_artifact_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let fragment = Fragment::from_xml(SSH).unwrap();
        let result = fragment.write_artifact(&temp_dir.path().join("no-such-dir"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

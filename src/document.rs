//! # Configuration Document Model
//!
//! This module owns the in-memory representation of the full configuration
//! document: one XML tree containing exactly one `ConnectionComponents`
//! collection element, whose `ConnectionComponent` children are the units of
//! backup and restore.
//!
//! ## Key Components
//!
//! - **`Document`**: the ownership root. Created by [`Document::load`] /
//!   [`Document::from_str`], which fail fast when the markup is not
//!   well-formed or the collection element is missing. Persisted by
//!   [`Document::save`], which writes to a temporary file next to the
//!   destination and renames it into place, so a failed save never leaves a
//!   half-written document behind.
//! - **Component lookup**: [`Document::find_component`] locates a component
//!   by exact, case-sensitive `Id` match, returning the first match in
//!   document order. Id uniqueness inside a document is the document
//!   author's responsibility, not enforced here.
//! - **Extraction and absorption**: [`Document::extract_component`] produces
//!   a detached [`Fragment`] copy; [`Document::absorb_component`] deep-copies
//!   a candidate fragment into this document's tree, replacing an existing
//!   component in place or appending a new one.
//!
//! All node handles stay private to this module; callers only ever see owned
//! `Fragment` values and batch reports, so no dangling references into the
//! tree can escape a mutation.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use xot::{NameId, Node, Xot};

use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::merge::MergeAction;

/// Element that owns the ordered collection of connection components.
pub const COLLECTION_ELEMENT: &str = "ConnectionComponents";

/// Element representing one connection component.
pub const COMPONENT_ELEMENT: &str = "ConnectionComponent";

/// Attribute carrying the component identity key.
pub const ID_ATTRIBUTE: &str = "Id";

/// Interned element/attribute names used throughout document operations.
struct Names {
    collection: NameId,
    component: NameId,
    id: NameId,
}

/// A parsed configuration document.
///
/// Owns the whole XML tree plus a handle to its `ConnectionComponents`
/// collection element.
pub struct Document {
    xot: Xot,
    root: Node,
    collection: Node,
    names: Names,
}

impl Document {
    /// Parse a document from its XML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` when the markup is not well-formed or no
    /// `ConnectionComponents` element exists anywhere in the document.
    pub fn from_str(xml: &str) -> Result<Self> {
        let mut xot = Xot::new();
        let root = xot.parse(xml).map_err(|e| Error::Parse {
            message: e.to_string(),
        })?;
        let names = Names {
            collection: xot.add_name(COLLECTION_ELEMENT),
            component: xot.add_name(COMPONENT_ELEMENT),
            id: xot.add_name(ID_ATTRIBUTE),
        };
        let top = xot.document_element(root).map_err(|e| Error::Parse {
            message: e.to_string(),
        })?;
        let collection =
            locate_collection(&xot, top, names.collection).ok_or_else(|| Error::Parse {
                message: format!("document has no <{}> element", COLLECTION_ELEMENT),
            })?;

        Ok(Document {
            xot,
            root,
            collection,
            names,
        })
    }

    /// Load a document from a local file.
    pub fn load(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)?;
        Self::from_str(&xml)
    }

    /// Serialize the whole document back to XML text.
    pub fn to_xml_string(&self) -> Result<String> {
        self.xot.to_string(self.root).map_err(|e| Error::Parse {
            message: format!("failed to serialize document: {}", e),
        })
    }

    /// Persist the document to `destination` atomically.
    ///
    /// The serialized document is written to a temporary file in the
    /// destination directory and renamed over the destination, so the
    /// previous on-disk state survives any mid-save failure.
    pub fn save(&self, destination: &Path) -> Result<()> {
        let xml = self.to_xml_string()?;
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let save_error = |message: String| Error::Save {
            path: destination.to_path_buf(),
            message,
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| save_error(e.to_string()))?;
        tmp.write_all(xml.as_bytes())
            .map_err(|e| save_error(e.to_string()))?;
        tmp.persist(destination)
            .map_err(|e| save_error(e.to_string()))?;
        log::debug!("saved document to '{}'", destination.display());
        Ok(())
    }

    /// Ids of all components, in document order.
    pub fn component_ids(&self) -> Vec<String> {
        self.components()
            .filter_map(|node| self.attribute(node, self.names.id))
            .collect()
    }

    /// Whether a component with this exact Id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.find_component(id).is_some()
    }

    /// Locate a component by exact, case-sensitive Id match.
    ///
    /// Returns the first match in document order when the source document
    /// violates Id uniqueness.
    fn find_component(&self, id: &str) -> Option<Node> {
        self.components()
            .find(|&node| self.attribute(node, self.names.id).as_deref() == Some(id))
    }

    /// Extract a component as a detached, independently owned fragment.
    ///
    /// The fragment is a deep copy carrying any namespace prefixes declared
    /// on ancestors, so it serializes standalone; mutating the source
    /// document afterwards does not affect it.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when no component has the requested Id.
    pub fn extract_component(&mut self, id: &str) -> Result<Fragment> {
        let node = self
            .find_component(id)
            .ok_or_else(|| Error::NotFound { id: id.to_string() })?;
        let copy = self.xot.clone_with_prefixes(node);
        let xml = self.xot.to_string(copy).map_err(|e| Error::Parse {
            message: format!("failed to serialize component '{}': {}", id, e),
        })?;
        Ok(Fragment::from_parts(id.to_string(), xml))
    }

    /// Absorb one candidate fragment into this document.
    ///
    /// The candidate is re-parsed and deep-copied into this document's tree.
    /// An existing component with the same Id is replaced in place,
    /// preserving its position in the collection; otherwise the copy is
    /// appended as the last component.
    ///
    /// # Errors
    ///
    /// `Error::MergeFragment` when the candidate cannot be absorbed: it does
    /// not re-parse, its root element is not a `ConnectionComponent`, or its
    /// Id attribute disagrees with the fragment's identity key.
    pub fn absorb_component(&mut self, fragment: &Fragment) -> Result<MergeAction> {
        let merge_error = |message: String| Error::MergeFragment {
            id: fragment.id().to_string(),
            message,
        };

        let parsed = self
            .xot
            .parse(fragment.as_xml())
            .map_err(|e| merge_error(format!("candidate does not parse: {}", e)))?;
        let candidate = self
            .xot
            .document_element(parsed)
            .map_err(|e| merge_error(e.to_string()))?;

        let is_component = self
            .xot
            .element(candidate)
            .map(|element| element.name() == self.names.component)
            .unwrap_or(false);
        if !is_component {
            return Err(merge_error(format!(
                "root element is not <{}>",
                COMPONENT_ELEMENT
            )));
        }
        match self.attribute(candidate, self.names.id) {
            Some(candidate_id) if candidate_id == fragment.id() => {}
            Some(candidate_id) => {
                return Err(merge_error(format!(
                    "candidate Id '{}' does not match '{}'",
                    candidate_id,
                    fragment.id()
                )));
            }
            None => {
                return Err(merge_error(format!(
                    "candidate is missing the {} attribute",
                    ID_ATTRIBUTE
                )));
            }
        }

        // Deep copy into this document's ownership scope; the parsed
        // candidate tree itself is never attached.
        let copy = self.xot.clone_with_prefixes(candidate);

        match self.find_component(fragment.id()) {
            Some(existing) => {
                self.xot
                    .insert_before(existing, copy)
                    .map_err(|e| merge_error(e.to_string()))?;
                self.xot
                    .remove(existing)
                    .map_err(|e| merge_error(e.to_string()))?;
                Ok(MergeAction::Replaced)
            }
            None => {
                self.xot
                    .append(self.collection, copy)
                    .map_err(|e| merge_error(e.to_string()))?;
                Ok(MergeAction::Appended)
            }
        }
    }

    /// Component element children of the collection, in document order.
    fn components(&self) -> impl Iterator<Item = Node> + '_ {
        self.xot.children(self.collection).filter(|&node| {
            self.xot
                .element(node)
                .map(|element| element.name() == self.names.component)
                .unwrap_or(false)
        })
    }

    fn attribute(&self, node: Node, name: NameId) -> Option<String> {
        self.xot
            .attributes(node)
            .get(name)
            .map(|value| value.to_string())
    }
}

/// Find the collection element: the document element itself, or the first
/// descendant in document order.
fn locate_collection(xot: &Xot, top: Node, name: NameId) -> Option<Node> {
    let is_collection = |node: &Node| {
        xot.element(*node)
            .map(|element| element.name() == name)
            .unwrap_or(false)
    };
    if is_collection(&top) {
        return Some(top);
    }
    xot.descendants(top).find(is_collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<PasswordVaultConfiguration>
  <General><RefreshPeriod>60</RefreshPeriod></General>
  <ConnectionComponents>
    <ConnectionComponent Id="PSM-SSH"><ClientApp>ssh</ClientApp></ConnectionComponent>
    <ConnectionComponent Id="PSM-RDP"><ClientApp>rdp</ClientApp></ConnectionComponent>
  </ConnectionComponents>
</PasswordVaultConfiguration>"#;

    #[test]
    fn test_from_str_parses_nested_collection() {
        let document = Document::from_str(SAMPLE).unwrap();
        assert_eq!(document.component_ids(), vec!["PSM-SSH", "PSM-RDP"]);
    }

    #[test]
    fn test_from_str_collection_as_document_element() {
        let xml = r#"<ConnectionComponents><ConnectionComponent Id="A"/></ConnectionComponents>"#;
        let document = Document::from_str(xml).unwrap();
        assert_eq!(document.component_ids(), vec!["A"]);
    }

    #[test]
    fn test_from_str_rejects_malformed_markup() {
        let result = Document::from_str("<PasswordVaultConfiguration><unclosed>");
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_from_str_rejects_missing_collection() {
        let result = Document::from_str("<PasswordVaultConfiguration/>");
        match result {
            Err(Error::Parse { message }) => assert!(message.contains("ConnectionComponents")),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let document = Document::from_str(SAMPLE).unwrap();
        assert!(document.contains("PSM-SSH"));
        assert!(!document.contains("psm-ssh"));
        assert!(!document.contains("PSM-Telnet"));
    }

    #[test]
    fn test_extract_component_detached_copy() {
        let mut document = Document::from_str(SAMPLE).unwrap();
        let fragment = document.extract_component("PSM-SSH").unwrap();
        assert_eq!(fragment.id(), "PSM-SSH");
        assert!(fragment.as_xml().contains("<ClientApp>ssh</ClientApp>"));
        // The copy must not carry any collection wrapper.
        assert!(!fragment.as_xml().contains(COLLECTION_ELEMENT));
    }

    #[test]
    fn test_extract_component_missing_id() {
        let mut document = Document::from_str(SAMPLE).unwrap();
        let result = document.extract_component("PSM-Telnet");
        assert!(matches!(result, Err(Error::NotFound { id }) if id == "PSM-Telnet"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("PVConfiguration.xml");

        let document = Document::from_str(SAMPLE).unwrap();
        document.save(&path).unwrap();

        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.component_ids(), vec!["PSM-SSH", "PSM-RDP"]);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("PVConfiguration.xml");
        fs::write(&path, "stale content").unwrap();

        let document = Document::from_str(SAMPLE).unwrap();
        document.save(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("ConnectionComponents"));
        assert!(!written.contains("stale content"));
    }

    #[test]
    fn test_save_failure_leaves_destination_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("missing-dir").join("PVConfiguration.xml");

        let document = Document::from_str(SAMPLE).unwrap();
        let result = document.save(&destination);
        assert!(matches!(result, Err(Error::Save { .. })));
        assert!(!destination.exists());
    }

    #[test]
    fn test_duplicate_ids_first_match_wins() {
        let xml = r#"<Root><ConnectionComponents>
            <ConnectionComponent Id="Dup"><Order>first</Order></ConnectionComponent>
            <ConnectionComponent Id="Dup"><Order>second</Order></ConnectionComponent>
        </ConnectionComponents></Root>"#;
        let mut document = Document::from_str(xml).unwrap();
        let fragment = document.extract_component("Dup").unwrap();
        assert!(fragment.as_xml().contains("first"));
    }
}

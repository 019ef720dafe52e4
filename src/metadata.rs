//! Metadata payloads and the pluggable per-format reader registry.
//!
//! Records carry their metadata in a format selected by a metadata
//! prefix. The client treats the payload as an opaque field map produced
//! by whatever reader is registered for the prefix; callers control the
//! registry and its lifetime. A Dublin Core reader is provided since
//! every OAI-PMH repository must support `oai_dc`.

use std::collections::{BTreeMap, HashMap};

use roxmltree::Node;
use serde::Serialize;

use crate::error::{HarvestError, Result};
use crate::xml::{local_name, text_of};

/// The fifteen Dublin Core 1.1 element names.
const DUBLIN_CORE_FIELDS: [&str; 15] = [
    "title",
    "creator",
    "subject",
    "description",
    "publisher",
    "contributor",
    "date",
    "type",
    "format",
    "identifier",
    "source",
    "language",
    "relation",
    "coverage",
    "rights",
];

/// Format-agnostic metadata payload: named fields, each with zero or
/// more values in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a field, creating the field if needed.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(value.into());
    }

    /// All values of a field, empty slice if the field is absent.
    #[must_use]
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// First value of a field, if any.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.field(name).first().map(String::as_str)
    }

    /// Whether the payload carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field, values)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Reads one metadata format out of a record's `metadata` element.
pub trait MetadataReader {
    /// Extract the payload from the `metadata` element node.
    fn read_metadata(&self, metadata_node: Node<'_, '_>) -> Result<Metadata>;
}

/// Reader for the mandatory `oai_dc` format.
///
/// Collects the text of every Dublin Core element under the `dc`
/// container, grouped by element name in document order.
#[derive(Debug, Default)]
pub struct DublinCoreReader;

impl MetadataReader for DublinCoreReader {
    fn read_metadata(&self, metadata_node: Node<'_, '_>) -> Result<Metadata> {
        let mut payload = Metadata::new();
        for node in metadata_node.descendants().filter(|n| n.is_element()) {
            let name = local_name(node);
            if DUBLIN_CORE_FIELDS.contains(&name) {
                let value = text_of(node);
                if !value.is_empty() {
                    payload.push(name, value);
                }
            }
        }
        Ok(payload)
    }
}

/// Registry mapping metadata prefixes to readers.
///
/// Explicitly owned by the caller (usually via the [`crate::Client`]);
/// there is no process-wide default instance.
#[derive(Default)]
pub struct MetadataRegistry {
    readers: HashMap<String, Box<dyn MetadataReader>>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reader for a prefix, replacing any existing one.
    pub fn register(&mut self, prefix: impl Into<String>, reader: Box<dyn MetadataReader>) {
        self.readers.insert(prefix.into(), reader);
    }

    /// Whether a reader is registered for the prefix.
    #[must_use]
    pub fn has_reader(&self, prefix: &str) -> bool {
        self.readers.contains_key(prefix)
    }

    /// Read a record's metadata with the reader registered for the
    /// prefix.
    ///
    /// Fails with [`HarvestError::UnregisteredPrefix`] when no reader
    /// covers the prefix.
    pub fn read_metadata(&self, prefix: &str, metadata_node: Node<'_, '_>) -> Result<Metadata> {
        let reader = self
            .readers
            .get(prefix)
            .ok_or_else(|| HarvestError::UnregisteredPrefix(prefix.to_string()))?;
        reader.read_metadata(metadata_node)
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("prefixes", &self.readers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry with the `oai_dc` reader pre-registered.
#[must_use]
pub fn default_registry() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    registry.register("oai_dc", Box::new(DublinCoreReader));
    registry
}

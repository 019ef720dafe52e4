//! Core data types for the harvesting client.
//!
//! These types are the domain-side view of OAI-PMH response documents:
//! the repository self-description, record headers, full records and
//! set descriptors.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metadata::Metadata;

/// The six OAI-PMH protocol verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Identify,
    ListMetadataFormats,
    GetRecord,
    ListIdentifiers,
    ListRecords,
    ListSets,
}

impl Verb {
    /// Protocol spelling of the verb, as sent in the `verb` parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "Identify",
            Self::ListMetadataFormats => "ListMetadataFormats",
            Self::GetRecord => "GetRecord",
            Self::ListIdentifiers => "ListIdentifiers",
            Self::ListRecords => "ListRecords",
            Self::ListSets => "ListSets",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository policy for deleted records, from the Identify response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedRecordPolicy {
    /// Repository keeps no information about deletions.
    No,
    /// Deletions are advertised but may disappear again.
    Transient,
    /// Deletions are advertised permanently.
    Persistent,
}

impl DeletedRecordPolicy {
    /// Parse the `deletedRecord` element text.
    ///
    /// Unknown or missing values fall back to [`Self::No`], the weakest
    /// guarantee.
    #[must_use]
    pub fn from_protocol(text: &str) -> Self {
        match text {
            "transient" => Self::Transient,
            "persistent" => Self::Persistent,
            _ => Self::No,
        }
    }

    /// Protocol spelling of the policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Transient => "transient",
            Self::Persistent => "persistent",
        }
    }
}

/// Repository self-description from the Identify verb.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identify {
    /// Human-readable repository name.
    pub repository_name: String,

    /// Base URL the repository answers requests on.
    pub base_url: String,

    /// Protocol version the repository speaks (normally "2.0").
    pub protocol_version: String,

    /// Administrator contact addresses.
    pub admin_emails: Vec<String>,

    /// Earliest datestamp any record in the repository can carry.
    pub earliest_datestamp: DateTime<Utc>,

    /// How the repository advertises deletions.
    pub deleted_record: DeletedRecordPolicy,

    /// Datestamp granularity the repository supports.
    pub granularity: String,

    /// Compression schemes offered beyond the mandatory identity
    /// encoding. Empty for most repositories.
    pub compression: Vec<String>,
}

/// Record header: identity and harvesting state of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    /// Unique item identifier within the repository.
    pub identifier: String,

    /// Datestamp of the last modification (or deletion) of the item.
    pub datestamp: DateTime<Utc>,

    /// Sets the item belongs to, in document order.
    pub set_specs: Vec<String>,

    /// Whether the item has been deleted from the repository.
    pub deleted: bool,
}

impl Header {
    /// Create a live (non-deleted) header.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        datestamp: DateTime<Utc>,
        set_specs: Vec<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            datestamp,
            set_specs,
            deleted: false,
        }
    }
}

/// A harvested record: header plus optional metadata payload.
///
/// The metadata is absent exactly when the repository returned no
/// `metadata` element, which is the expected shape for deleted records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Header of the record.
    pub header: Header,

    /// Metadata payload in the requested format, if present.
    pub metadata: Option<Metadata>,

    /// About container. Repositories rarely populate this and this
    /// client does not parse it; always `None`.
    pub about: Option<Metadata>,
}

/// One metadata format the repository can disseminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataFormat {
    /// Prefix used to request the format (e.g., "oai_dc").
    pub prefix: String,

    /// URL of the XML schema for the format.
    pub schema: String,

    /// XML namespace URI of the format.
    pub namespace: String,
}

/// One set the repository partitions its records into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Set {
    /// Machine-readable set specifier (colon-separated hierarchy).
    pub spec: String,

    /// Human-readable set name.
    pub name: String,

    /// Set description container. Not parsed by this client; always
    /// `None`.
    pub description: Option<Metadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_verb_as_str() {
        assert_eq!(Verb::Identify.as_str(), "Identify");
        assert_eq!(Verb::ListRecords.as_str(), "ListRecords");
        assert_eq!(Verb::ListMetadataFormats.to_string(), "ListMetadataFormats");
    }

    #[test]
    fn test_deleted_record_policy_from_protocol() {
        assert_eq!(
            DeletedRecordPolicy::from_protocol("no"),
            DeletedRecordPolicy::No
        );
        assert_eq!(
            DeletedRecordPolicy::from_protocol("transient"),
            DeletedRecordPolicy::Transient
        );
        assert_eq!(
            DeletedRecordPolicy::from_protocol("persistent"),
            DeletedRecordPolicy::Persistent
        );
        // Unknown text falls back to the weakest guarantee
        assert_eq!(
            DeletedRecordPolicy::from_protocol("sometimes"),
            DeletedRecordPolicy::No
        );
        assert_eq!(
            DeletedRecordPolicy::from_protocol(""),
            DeletedRecordPolicy::No
        );
    }

    #[test]
    fn test_header_new() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let header = Header::new("oai:example:1", t, vec!["physics".to_string()]);
        assert_eq!(header.identifier, "oai:example:1");
        assert!(!header.deleted);
        assert_eq!(header.set_specs, vec!["physics"]);
    }
}

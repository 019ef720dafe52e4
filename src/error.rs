//! Error types for the harvesting client.
//!
//! One variant per OAI-PMH protocol error condition, plus structural
//! variants for transport, XML and datestamp failures.

use thiserror::Error;

/// Main error type for the harvesting library.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Server rejected a request argument (`badArgument`).
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Resumption token is invalid or expired (`badResumptionToken`).
    #[error("bad resumption token: {0}")]
    BadResumptionToken(String),

    /// Server did not recognize the verb (`badVerb`).
    #[error("bad verb: {0}")]
    BadVerb(String),

    /// Requested metadata format is unavailable for the item
    /// (`cannotDisseminateFormat`).
    #[error("cannot disseminate format: {0}")]
    CannotDisseminateFormat(String),

    /// Unknown item identifier (`idDoesNotExist`).
    #[error("id does not exist: {0}")]
    IdDoesNotExist(String),

    /// No records match the request arguments (`noRecordsMatch`).
    #[error("no records match: {0}")]
    NoRecordsMatch(String),

    /// No metadata formats are available for the item
    /// (`noMetadataFormats`).
    #[error("no metadata formats: {0}")]
    NoMetadataFormats(String),

    /// Repository does not support sets (`noSetHierarchy`).
    #[error("no set hierarchy: {0}")]
    NoSetHierarchy(String),

    /// Protocol error code outside the OAI-PMH 2.0 taxonomy.
    #[error("unknown error code from server: {code}, message: {message}")]
    UnknownProtocol { code: String, message: String },

    /// Server kept asking us to retry until the attempt budget ran out.
    #[error("server still unavailable after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Text does not match the OAI datestamp grammar.
    #[error("invalid datestamp: '{0}'. Expected YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ")]
    Datestamp(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Response body is not valid UTF-8.
    #[error("response is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Missing required XML element.
    #[error("missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// No metadata reader registered for the requested prefix.
    #[error("no metadata reader registered for prefix '{0}'")]
    UnregisteredPrefix(String),
}

impl HarvestError {
    /// Map a protocol `<error>` element to its typed variant.
    ///
    /// Codes outside the fixed OAI-PMH 2.0 set map to
    /// [`HarvestError::UnknownProtocol`] with the code and message
    /// carried verbatim.
    pub fn from_protocol_code(code: &str, message: String) -> Self {
        match code {
            "badArgument" => Self::BadArgument(message),
            "badResumptionToken" => Self::BadResumptionToken(message),
            "badVerb" => Self::BadVerb(message),
            "cannotDisseminateFormat" => Self::CannotDisseminateFormat(message),
            "idDoesNotExist" => Self::IdDoesNotExist(message),
            "noRecordsMatch" => Self::NoRecordsMatch(message),
            "noMetadataFormats" => Self::NoMetadataFormats(message),
            "noSetHierarchy" => Self::NoSetHierarchy(message),
            _ => Self::UnknownProtocol {
                code: code.to_string(),
                message,
            },
        }
    }
}

/// Result type alias for harvesting operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_typed_variants() {
        let err = HarvestError::from_protocol_code("noRecordsMatch", "none".to_string());
        assert!(matches!(err, HarvestError::NoRecordsMatch(m) if m == "none"));

        let err = HarvestError::from_protocol_code("badResumptionToken", "expired".to_string());
        assert!(matches!(err, HarvestError::BadResumptionToken(m) if m == "expired"));
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let err = HarvestError::from_protocol_code("weirdCode", "oops".to_string());
        match err {
            HarvestError::UnknownProtocol { code, message } => {
                assert_eq!(code, "weirdCode");
                assert_eq!(message, "oops");
            }
            other => panic!("expected UnknownProtocol, got {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = HarvestError::RetriesExhausted { attempts: 3 };
        assert!(err.to_string().contains("3 attempts"));

        let err = HarvestError::Datestamp("not-a-date".to_string());
        assert!(err.to_string().contains("not-a-date"));
    }
}

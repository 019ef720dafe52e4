//! The harvesting client: one method per protocol verb.
//!
//! Every verb follows the same pipeline: send the request through the
//! retry loop, decode and parse the body, classify protocol errors,
//! then map the document. The three list verbs return the lazy
//! cross-page iterator from [`crate::pagination`]; continuation pages
//! run through the exact same pipeline as first pages.

use std::time::Duration;

use chrono::{DateTime, Utc};
use roxmltree::Document;

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_WAIT_SECS};
use crate::datestamp;
use crate::error::{HarvestError, Result};
use crate::metadata::{default_registry, MetadataRegistry};
use crate::pagination::{Page, ResumptionIter};
use crate::response::{
    check_protocol_errors, map_headers, map_identify, map_metadata_formats, map_records, map_sets,
};
use crate::transport::{request_with_retry, HttpTransport, Transport};
use crate::types::{Header, Identify, MetadataFormat, Record, Set, Verb};

/// OAI-PMH harvesting client.
///
/// Generic over the transport so tests (and in-process repositories)
/// can substitute the HTTP layer; [`HttpTransport`] is the default.
pub struct Client<T: Transport = HttpTransport> {
    transport: T,
    registry: MetadataRegistry,
    max_attempts: u32,
    default_wait: Duration,
    ignore_bad_characters: bool,
}

impl Client<HttpTransport> {
    /// Create a client for the repository at `base_url`, with the
    /// default Dublin Core registry and retry policy.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(base_url)?))
    }

    /// Attach basic-auth credentials to every request.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.transport = self.transport.with_credentials(username, password);
        self
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            registry: default_registry(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            default_wait: Duration::from_secs(DEFAULT_RETRY_WAIT_SECS),
            ignore_bad_characters: false,
        }
    }

    /// Replace the metadata-format registry.
    #[must_use]
    pub fn with_registry(mut self, registry: MetadataRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override the retry policy: total attempt budget per request and
    /// the wait used when the server gives no Retry-After hint.
    #[must_use]
    pub fn with_retry_policy(mut self, max_attempts: u32, default_wait: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.default_wait = default_wait;
        self
    }

    /// Tolerate malformed UTF-8 in response bodies by substituting the
    /// replacement character. Some repositories serve bytes that are
    /// not quite the UTF-8 they declare.
    #[must_use]
    pub fn ignore_bad_characters(mut self, ignore: bool) -> Self {
        self.ignore_bad_characters = ignore;
        self
    }

    /// The metadata registry in use.
    #[must_use]
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Identify the repository.
    pub fn identify(&self) -> Result<Identify> {
        self.fetch(Verb::Identify, Vec::new(), |doc| map_identify(doc))
    }

    /// List the metadata formats the repository disseminates, for one
    /// item or repository-wide.
    pub fn list_metadata_formats(&self, identifier: Option<&str>) -> Result<Vec<MetadataFormat>> {
        let mut params = Vec::new();
        if let Some(id) = identifier {
            params.push(("identifier".to_string(), id.to_string()));
        }
        self.fetch(Verb::ListMetadataFormats, params, |doc| {
            map_metadata_formats(doc)
        })
    }

    /// Fetch a single record in the given metadata format.
    pub fn get_record(&self, identifier: &str, metadata_prefix: &str) -> Result<Record> {
        let params = vec![
            ("identifier".to_string(), identifier.to_string()),
            ("metadataPrefix".to_string(), metadata_prefix.to_string()),
        ];
        self.fetch(Verb::GetRecord, params, |doc| {
            let (records, _) = map_records(doc, metadata_prefix, &self.registry)?;
            records
                .into_iter()
                .next()
                .ok_or_else(|| HarvestError::MissingElement {
                    element: "record".to_string(),
                    context: "GetRecord response".to_string(),
                })
        })
    }

    /// Harvest record headers, lazily spanning all pages.
    pub fn list_identifiers<'a>(
        &'a self,
        metadata_prefix: &str,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        set: Option<&str>,
    ) -> impl Iterator<Item = Result<Header>> + 'a {
        let params = selective_params(metadata_prefix, from, until, set);
        ResumptionIter::new(
            move || self.fetch_header_page(params),
            move |token| self.fetch_header_page(resumption_params(token)),
        )
    }

    /// Harvest full records, lazily spanning all pages.
    pub fn list_records<'a>(
        &'a self,
        metadata_prefix: &'a str,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        set: Option<&str>,
    ) -> impl Iterator<Item = Result<Record>> + 'a {
        let params = selective_params(metadata_prefix, from, until, set);
        ResumptionIter::new(
            move || self.fetch_record_page(metadata_prefix, params),
            move |token| self.fetch_record_page(metadata_prefix, resumption_params(token)),
        )
    }

    /// List the repository's sets, lazily spanning all pages.
    pub fn list_sets(&self) -> impl Iterator<Item = Result<Set>> + '_ {
        ResumptionIter::new(
            move || self.fetch_set_page(Vec::new()),
            move |token| self.fetch_set_page(resumption_params(token)),
        )
    }

    /// One full request pipeline: retry loop, decode, parse, error
    /// classification, then the verb-specific mapping.
    fn fetch<R>(
        &self,
        verb: Verb,
        params: Vec<(String, String)>,
        map: impl FnOnce(&Document<'_>) -> Result<R>,
    ) -> Result<R> {
        let bytes = request_with_retry(
            || self.transport.send(verb, &params),
            self.max_attempts,
            self.default_wait,
        )?;
        let xml = self.decode_body(bytes)?;
        let doc = Document::parse(&xml)?;
        check_protocol_errors(&doc)?;
        map(&doc)
    }

    fn fetch_header_page(&self, params: Vec<(String, String)>) -> Result<Page<Header>> {
        self.fetch(Verb::ListIdentifiers, params, |doc| {
            let (headers, token) = map_headers(doc, "ListIdentifiers")?;
            Ok(Page::new(headers, token))
        })
    }

    fn fetch_record_page(
        &self,
        metadata_prefix: &str,
        params: Vec<(String, String)>,
    ) -> Result<Page<Record>> {
        self.fetch(Verb::ListRecords, params, |doc| {
            let (records, token) = map_records(doc, metadata_prefix, &self.registry)?;
            Ok(Page::new(records, token))
        })
    }

    fn fetch_set_page(&self, params: Vec<(String, String)>) -> Result<Page<Set>> {
        self.fetch(Verb::ListSets, params, |doc| {
            let (sets, token) = map_sets(doc)?;
            Ok(Page::new(sets, token))
        })
    }

    fn decode_body(&self, bytes: Vec<u8>) -> Result<String> {
        if self.ignore_bad_characters {
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            Ok(String::from_utf8(bytes)?)
        }
    }
}

/// Request parameters of a selective-harvesting first page.
fn selective_params(
    metadata_prefix: &str,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    set: Option<&str>,
) -> Vec<(String, String)> {
    let mut params = vec![("metadataPrefix".to_string(), metadata_prefix.to_string())];
    if let Some(from) = from {
        params.push(("from".to_string(), datestamp::encode(&from)));
    }
    if let Some(until) = until {
        params.push(("until".to_string(), datestamp::encode(&until)));
    }
    if let Some(set) = set {
        params.push(("set".to_string(), set.to_string()));
    }
    params
}

/// A continuation request carries only the token (besides the verb).
fn resumption_params(token: &str) -> Vec<(String, String)> {
    vec![("resumptionToken".to_string(), token.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// In-process transport answering from a fixed script, in the
    /// spirit of serving the client from a local repository instead of
    /// HTTP.
    struct ScriptedTransport {
        requests: RefCell<Vec<(Verb, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                requests: RefCell::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }

        fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }

        fn record_page(items: &[(&str, &str)], token: &str) -> String {
            let records: String = items
                .iter()
                .map(|(id, title)| {
                    format!(
                        r#"<record><header><identifier>{id}</identifier>
<datestamp>2024-01-01</datestamp></header>
<metadata><oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
 xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{title}</dc:title></oai_dc:dc></metadata>
</record>"#
                    )
                })
                .collect();
            format!(
                r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
<ListRecords>{records}<resumptionToken>{token}</resumptionToken></ListRecords>
</OAI-PMH>"#
            )
        }
    }

    impl Transport for ScriptedTransport {
        fn send(
            &self,
            verb: Verb,
            params: &[(String, String)],
        ) -> std::result::Result<Vec<u8>, TransportError> {
            self.requests.borrow_mut().push((verb, params.to_vec()));

            let body = match verb {
                Verb::Identify => r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
<Identify><repositoryName>Scripted</repositoryName>
<earliestDatestamp>2000-01-01</earliestDatestamp>
<deletedRecord>no</deletedRecord></Identify></OAI-PMH>"#
                    .to_string(),
                Verb::ListRecords => match Self::param(params, "resumptionToken") {
                    None => Self::record_page(&[("oai:s:1", "one"), ("oai:s:2", "two")], "tok1"),
                    Some("tok1") => {
                        Self::record_page(&[("oai:s:3", "three"), ("oai:s:4", "four")], "tok2")
                    }
                    Some("tok2") => Self::record_page(&[("oai:s:5", "five")], ""),
                    Some(other) => format!(
                        r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
<error code="badResumptionToken">unknown token {other}</error></OAI-PMH>"#
                    ),
                },
                Verb::GetRecord => r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
<GetRecord><record><header><identifier>oai:s:42</identifier>
<datestamp>2024-02-02T00:00:00Z</datestamp></header>
<metadata><oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
 xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Answer</dc:title></oai_dc:dc></metadata>
</record></GetRecord></OAI-PMH>"#
                    .to_string(),
                _ => r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
<error code="badVerb">not scripted</error></OAI-PMH>"#
                    .to_string(),
            };
            Ok(body.into_bytes())
        }
    }

    #[test]
    fn test_identify() {
        let client = Client::with_transport(ScriptedTransport::new());
        let identify = client.identify().unwrap();
        assert_eq!(identify.repository_name, "Scripted");
        assert_eq!(
            identify.earliest_datestamp,
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_get_record() {
        let client = Client::with_transport(ScriptedTransport::new());
        let record = client.get_record("oai:s:42", "oai_dc").unwrap();
        assert_eq!(record.header.identifier, "oai:s:42");
        assert_eq!(record.metadata.unwrap().first("title"), Some("Answer"));
    }

    #[test]
    fn test_list_records_spans_three_pages() {
        let client = Client::with_transport(ScriptedTransport::new());
        let records: Vec<Record> = client
            .list_records("oai_dc", None, None, None)
            .map(|r| r.unwrap())
            .collect();

        let ids: Vec<&str> = records.iter().map(|r| r.header.identifier.as_str()).collect();
        assert_eq!(ids, ["oai:s:1", "oai:s:2", "oai:s:3", "oai:s:4", "oai:s:5"]);
        assert_eq!(client.transport.request_count(), 3);
    }

    #[test]
    fn test_list_records_is_lazy() {
        let client = Client::with_transport(ScriptedTransport::new());
        let mut iter = client.list_records("oai_dc", None, None, None);

        assert_eq!(client.transport.request_count(), 0);
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.header.identifier, "oai:s:1");
        assert_eq!(client.transport.request_count(), 1);
    }

    #[test]
    fn test_continuation_request_carries_only_token() {
        let client = Client::with_transport(ScriptedTransport::new());
        let _ = client
            .list_records("oai_dc", None, None, None)
            .take(3)
            .count();

        let requests = client.transport.requests.borrow();
        assert_eq!(requests.len(), 2);
        let (_, second_params) = &requests[1];
        assert_eq!(second_params.len(), 1);
        assert_eq!(
            ScriptedTransport::param(second_params, "resumptionToken"),
            Some("tok1")
        );
    }

    #[test]
    fn test_selective_params_are_encoded() {
        let client = Client::with_transport(ScriptedTransport::new());
        let from = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap();
        let _ = client
            .list_records("oai_dc", Some(from), Some(until), Some("physics"))
            .next();

        let requests = client.transport.requests.borrow();
        let (_, params) = &requests[0];
        assert_eq!(
            ScriptedTransport::param(params, "from"),
            Some("2023-06-01T00:00:00Z")
        );
        assert_eq!(
            ScriptedTransport::param(params, "until"),
            Some("2023-07-01T00:00:00Z")
        );
        assert_eq!(ScriptedTransport::param(params, "set"), Some("physics"));
        assert_eq!(
            ScriptedTransport::param(params, "metadataPrefix"),
            Some("oai_dc")
        );
    }

    #[test]
    fn test_protocol_error_on_verb() {
        let client = Client::with_transport(ScriptedTransport::new());
        let err = client.list_metadata_formats(None).unwrap_err();
        assert!(matches!(err, HarvestError::BadVerb(_)));
    }
}

//! Protocol and network constants for the harvesting client.

/// XML namespace of OAI-PMH 2.0 response documents.
pub const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";

/// Default wait between retries when the server sends no Retry-After
/// hint (seconds). Two minutes, matching common repository guidance.
pub const DEFAULT_RETRY_WAIT_SECS: u64 = 120;

/// Maximum number of attempts for a single request before giving up
/// on a repeatedly "retry later" server.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// HTTP timeout in seconds.
///
/// Set to 60 seconds: list responses from large repositories can be
/// several megabytes per page.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// User agent string identifying this harvester.
pub const USER_AGENT: &str = concat!("oai-harvest/", env!("CARGO_PKG_VERSION"));

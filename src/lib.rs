//! oai-harvest - OAI-PMH metadata harvesting client.
//!
//! This crate implements the client side of the OAI-PMH protocol:
//! verb-based requests against a remote repository, typed mapping of
//! the XML responses, a typed taxonomy for protocol error codes,
//! bounded retry on "retry later" server signaling, and transparent
//! lazy continuation of multi-page results via resumption tokens.
//!
//! # Example
//!
//! ```no_run
//! use oai_harvest::Client;
//!
//! let client = Client::new("https://repository.example.org/oai")?;
//! let identify = client.identify()?;
//! println!("harvesting {}", identify.repository_name);
//!
//! for record in client.list_records("oai_dc", None, None, None) {
//!     let record = record?;
//!     println!("{}", record.header.identifier);
//! }
//! # Ok::<(), oai_harvest::HarvestError>(())
//! ```
//!
//! # Architecture
//!
//! - [`config`]: protocol and network constants
//! - [`types`]: core data types (Identify, Header, Record, Set, ...)
//! - [`error`]: error types and Result alias
//! - [`datestamp`]: datestamp encoding and decoding
//! - [`xml`]: XML navigation helpers
//! - [`metadata`]: metadata payloads and the per-format reader registry
//! - [`transport`]: HTTP transport and the transient-failure retry loop
//! - [`response`]: protocol error classification and response mapping
//! - [`pagination`]: lazy resumption-token iteration
//! - [`client`]: the verb-level client surface
//! - [`cli`]: command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod datestamp;
pub mod error;
pub mod metadata;
pub mod pagination;
pub mod response;
pub mod transport;
pub mod types;
pub mod xml;

// Re-export the main entry points
pub use client::Client;
pub use error::{HarvestError, Result};
pub use metadata::{default_registry, Metadata, MetadataReader, MetadataRegistry};
pub use pagination::Page;
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{
    DeletedRecordPolicy, Header, Identify, MetadataFormat, Record, Set, Verb,
};

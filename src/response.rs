//! Response mapping: OAI-PMH XML documents into domain types.
//!
//! Every mapper assumes [`check_protocol_errors`] has already accepted
//! the document. All list-shaped responses share the same two-phase
//! shape: a flat run of sibling item nodes inside the verb container,
//! plus one optional trailing `resumptionToken` — which is what lets
//! [`crate::pagination`] drive every list verb with the same iterator.

use roxmltree::{Document, Node};

use crate::config::OAI_NAMESPACE;
use crate::datestamp;
use crate::error::{HarvestError, Result};
use crate::metadata::MetadataRegistry;
use crate::types::{DeletedRecordPolicy, Header, Identify, MetadataFormat, Record, Set};
use crate::xml::{child_text, child_texts, find_child, find_children, local_name, text_of};

/// Inspect a response for protocol-level `<error>` elements.
///
/// Runs before any mapping, on every page of a paginated harvest. When
/// several error elements are present only the first is reported; the
/// protocol gives no ordering meaning to the rest and collapsing to one
/// keeps error identity stable.
pub fn check_protocol_errors(doc: &Document<'_>) -> Result<()> {
    let root = doc.root_element();
    if local_name(root) != "OAI-PMH" {
        return Err(HarvestError::MissingElement {
            element: "OAI-PMH".to_string(),
            context: "response envelope".to_string(),
        });
    }
    if let Some(namespace) = root.tag_name().namespace() {
        if namespace != OAI_NAMESPACE {
            tracing::warn!(namespace, "unexpected envelope namespace");
        }
    }

    if let Some(error_node) = find_child(root, "error") {
        let code = error_node.attribute("code").unwrap_or_default();
        let message = text_of(error_node);
        return Err(HarvestError::from_protocol_code(code, message));
    }
    Ok(())
}

/// Map an Identify response.
///
/// Optional fields that are missing map to empty strings or vectors;
/// only an unparsable `earliestDatestamp` is an error.
pub fn map_identify(doc: &Document<'_>) -> Result<Identify> {
    let identify_node =
        find_child(doc.root_element(), "Identify").ok_or_else(|| HarvestError::MissingElement {
            element: "Identify".to_string(),
            context: "Identify response".to_string(),
        })?;

    let earliest_datestamp = datestamp::decode(&child_text(identify_node, "earliestDatestamp"))?;

    Ok(Identify {
        repository_name: child_text(identify_node, "repositoryName"),
        base_url: child_text(identify_node, "baseURL"),
        protocol_version: child_text(identify_node, "protocolVersion"),
        admin_emails: child_texts(identify_node, "adminEmail"),
        earliest_datestamp,
        deleted_record: DeletedRecordPolicy::from_protocol(&child_text(
            identify_node,
            "deletedRecord",
        )),
        granularity: child_text(identify_node, "granularity"),
        compression: child_texts(identify_node, "compression"),
    })
}

/// Map a ListMetadataFormats response, document order preserved.
pub fn map_metadata_formats(doc: &Document<'_>) -> Result<Vec<MetadataFormat>> {
    let container = find_child(doc.root_element(), "ListMetadataFormats").ok_or_else(|| {
        HarvestError::MissingElement {
            element: "ListMetadataFormats".to_string(),
            context: "ListMetadataFormats response".to_string(),
        }
    })?;

    Ok(find_children(container, "metadataFormat")
        .map(|node| MetadataFormat {
            prefix: child_text(node, "metadataPrefix"),
            schema: child_text(node, "schema"),
            namespace: child_text(node, "metadataNamespace"),
        })
        .collect())
}

/// Map a header-only list response (ListIdentifiers).
///
/// `container` names the verb's result element.
pub fn map_headers(doc: &Document<'_>, container: &str) -> Result<(Vec<Header>, Option<String>)> {
    let token = resumption_token(doc);
    let Some(container_node) = find_child(doc.root_element(), container) else {
        return Ok((Vec::new(), token));
    };

    let headers = find_children(container_node, "header")
        .map(build_header)
        .collect::<Result<Vec<_>>>()?;
    Ok((headers, token))
}

/// Map a record list response (ListRecords or GetRecord).
///
/// Record nodes are taken from whichever verb container is present.
/// A record without a `metadata` child maps to `metadata: None`; that
/// is the expected shape for deleted records, but the mapper reflects
/// the document rather than enforcing the correlation.
pub fn map_records(
    doc: &Document<'_>,
    metadata_prefix: &str,
    registry: &MetadataRegistry,
) -> Result<(Vec<Record>, Option<String>)> {
    let token = resumption_token(doc);

    let mut records = Vec::new();
    for record_node in result_containers(doc).flat_map(|c| find_children(c, "record")) {
        let header_node =
            find_child(record_node, "header").ok_or_else(|| HarvestError::MissingElement {
                element: "header".to_string(),
                context: "record".to_string(),
            })?;
        let header = build_header(header_node)?;

        let metadata = match find_child(record_node, "metadata") {
            Some(metadata_node) => Some(registry.read_metadata(metadata_prefix, metadata_node)?),
            None => None,
        };

        records.push(Record {
            header,
            metadata,
            about: None,
        });
    }

    Ok((records, token))
}

/// Map a ListSets response.
pub fn map_sets(doc: &Document<'_>) -> Result<(Vec<Set>, Option<String>)> {
    let token = resumption_token(doc);
    let Some(container) = find_child(doc.root_element(), "ListSets") else {
        return Ok((Vec::new(), token));
    };

    let sets = find_children(container, "set")
        .map(|node| Set {
            spec: child_text(node, "setSpec"),
            name: child_text(node, "setName"),
            description: None,
        })
        .collect();
    Ok((sets, token))
}

/// Build a [`Header`] from its element node.
fn build_header(header_node: Node<'_, '_>) -> Result<Header> {
    let datestamp = datestamp::decode(&child_text(header_node, "datestamp"))?;
    Ok(Header {
        identifier: child_text(header_node, "identifier"),
        datestamp,
        set_specs: child_texts(header_node, "setSpec"),
        deleted: header_node.attribute("status") == Some("deleted"),
    })
}

/// Element children of the OAI-PMH root (the verb result container
/// plus `request` and `responseDate`).
fn result_containers<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.root_element().children().filter(Node::is_element)
}

/// Extract the resumption token from the verb container, if present
/// and non-blank. A blank token is the in-band "no more pages" signal
/// and maps to `None`.
fn resumption_token(doc: &Document<'_>) -> Option<String> {
    result_containers(doc)
        .find_map(|container| find_child(container, "resumptionToken"))
        .map(text_of)
        .filter(|token| !token.is_empty())
}

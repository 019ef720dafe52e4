//! XML helpers for navigating OAI-PMH response trees.
//!
//! OAI-PMH documents qualify every element with the protocol namespace;
//! matching is done on the local tag name, which also tolerates the
//! unqualified documents some repositories emit.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
#[must_use]
pub fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given local tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oai_harvest::xml::find_child;
///
/// let xml = r#"<header><identifier>oai:x:1</identifier></header>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert!(find_child(doc.root_element(), "identifier").is_some());
/// assert!(find_child(doc.root_element(), "datestamp").is_none());
/// ```
#[must_use]
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && local_name(*child) == tag)
}

/// Find all child elements with the given local tag name, in document
/// order.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && local_name(*child) == tag)
}

/// Get the text content of a node, trimmed. Empty string if the node
/// has no text.
#[must_use]
pub fn text_of(node: Node<'_, '_>) -> String {
    node.text().map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Get the trimmed text of the first child with the given tag, or an
/// empty string when the child is missing.
#[must_use]
pub fn child_text(node: Node<'_, '_>, tag: &str) -> String {
    find_child(node, tag).map(text_of).unwrap_or_default()
}

/// Collect the trimmed texts of all children with the given tag,
/// preserving document order and skipping empty entries.
#[must_use]
pub fn child_texts(node: Node<'_, '_>, tag: &str) -> Vec<String> {
    find_children(node, tag)
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect()
}

//! Host document abstraction and content assignment.
//!
//! [`Document`] is the small slice of a DOM the content loader needs.
//! [`memory::MemoryDocument`] implements it in memory.

pub mod memory;

/// Errors raised by a [`Document`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// No element with the given id exists.
    #[error("no element with id `{0}`")]
    NotFound(String),

    /// The host refused to assign markup directly into this element.
    #[error("cannot assign content into <{tag}>: {reason}")]
    AssignmentRejected { tag: String, reason: String },

    /// A node was not where the operation expected it.
    #[error("hierarchy error: {0}")]
    Hierarchy(String),
}

/// The operations of a host document used to replace element content.
pub trait Document: Send + Sync + 'static {
    /// Reference to a node of this document.
    type Node: Clone + Send + Sync + 'static;

    fn get_element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Creates a detached element.
    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

    /// Replaces the element's children with the given markup.
    fn set_inner_html(&self, element: &Self::Node, html: &str) -> Result<(), DomError>;

    /// The element's children, in order.
    fn child_nodes(&self, element: &Self::Node) -> Vec<Self::Node>;

    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Appends a node, moving it out of its current parent.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;
}

/// Where loaded content goes: an element, or the id of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<N> {
    Element(N),
    Id(String),
}

impl<N> From<&str> for Target<N> {
    fn from(id: &str) -> Self {
        Target::Id(id.to_string())
    }
}

impl<N> From<String> for Target<N> {
    fn from(id: String) -> Self {
        Target::Id(id)
    }
}

/// Replaces the content of `element` with `html`.
///
/// Direct assignment is tried first. If the document rejects it, the markup
/// is parsed into a detached `div`, the element is emptied, and the
/// placeholder's children are moved over in order.
///
/// # Examples
///
/// ```
/// use xhrkit::dom::{memory::MemoryDocument, set_content};
///
/// let doc = MemoryDocument::new();
/// let table = doc.insert_element("grid", "table");
/// doc.reject_inner_html("table");
///
/// set_content(&doc, &table, "<tr><td>1</td></tr>").unwrap();
/// assert_eq!(doc.inner_html(&table), "<tr><td>1</td></tr>");
/// ```
pub fn set_content<D: Document + ?Sized>(
    document: &D,
    element: &D::Node,
    html: &str,
) -> Result<(), DomError> {
    let error = match document.set_inner_html(element, html) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    tracing::debug!(
        error = %error,
        "Direct content assignment failed, moving nodes from a placeholder"
    );

    let placeholder = document.create_element("div")?;
    document.set_inner_html(&placeholder, html)?;

    for child in document.child_nodes(element) {
        document.remove_child(element, &child)?;
    }
    for child in document.child_nodes(&placeholder) {
        document.append_child(element, &child)?;
    }
    Ok(())
}

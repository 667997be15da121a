//! An in-memory [`Document`] for headless use and tests.
//!
//! Markup assigned with `set_inner_html` is not parsed into a tree; it is
//! split into top-level chunks, each stored as one opaque fragment node.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use super::{Document, DomError};

/// Reference to a node of a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    Element { tag: String, id: Option<String> },
    Fragment(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<NodeData>,
    rejected_tags: HashSet<String>,
}

impl Tree {
    fn push(&mut self, kind: NodeKind) -> usize {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DomError::Hierarchy(format!("unknown node {}", id.0)))
    }

    fn detach(&mut self, child: usize) {
        if let Some(parent) = self.nodes[child].parent.take() {
            self.nodes[parent].children.retain(|&c| c != child);
        }
    }

    fn render(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        match &node.kind {
            NodeKind::Fragment(html) => out.push_str(html),
            NodeKind::Element { tag, id } => {
                match id {
                    Some(id) => out.push_str(&format!("<{} id=\"{}\">", tag, id)),
                    None => out.push_str(&format!("<{}>", tag)),
                }
                for &child in &node.children {
                    self.render(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

/// An in-memory document.
///
/// The document starts with a `body` element; [`MemoryDocument::insert_element`]
/// adds elements under it. Tags registered with
/// [`MemoryDocument::reject_inner_html`] refuse direct content assignment,
/// the way some hosts refuse `innerHTML` on table elements.
///
/// # Examples
///
/// ```
/// use xhrkit::dom::{memory::MemoryDocument, Document};
///
/// let doc = MemoryDocument::new();
/// let main = doc.insert_element("main", "section");
/// doc.set_inner_html(&main, "<h1>Hi</h1><p>there</p>").unwrap();
///
/// assert_eq!(doc.child_nodes(&main).len(), 2);
/// assert_eq!(doc.inner_html(&main), "<h1>Hi</h1><p>there</p>");
/// ```
#[derive(Debug)]
pub struct MemoryDocument {
    tree: Mutex<Tree>,
    body: NodeId,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut tree = Tree::default();
        let body = tree.push(NodeKind::Element {
            tag: "body".to_string(),
            id: None,
        });
        Self {
            tree: Mutex::new(tree),
            body: NodeId(body),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds an element with an id as the last child of `body`.
    pub fn insert_element(&self, id: &str, tag: &str) -> NodeId {
        let mut tree = self.tree();
        let index = tree.push(NodeKind::Element {
            tag: tag.to_string(),
            id: Some(id.to_string()),
        });
        tree.nodes[index].parent = Some(self.body.0);
        tree.nodes[self.body.0].children.push(index);
        NodeId(index)
    }

    /// Makes direct content assignment fail for elements with this tag.
    pub fn reject_inner_html(&self, tag: &str) {
        self.tree().rejected_tags.insert(tag.to_ascii_lowercase());
    }

    /// Serialized children of a node.
    pub fn inner_html(&self, node: &NodeId) -> String {
        let tree = self.tree();
        let mut out = String::new();
        if let Some(data) = tree.nodes.get(node.0) {
            for &child in &data.children {
                tree.render(child, &mut out);
            }
        }
        out
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.tree().nodes.get(node.0)?.parent.map(NodeId)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree()
            .nodes
            .iter()
            .position(|n| matches!(&n.kind, NodeKind::Element { id: Some(i), .. } if i == id))
            .map(NodeId)
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        let index = self.tree().push(NodeKind::Element {
            tag: tag.to_string(),
            id: None,
        });
        Ok(NodeId(index))
    }

    fn set_inner_html(&self, element: &NodeId, html: &str) -> Result<(), DomError> {
        let mut tree = self.tree();
        let tag = match &tree.node(*element)?.kind {
            NodeKind::Element { tag, .. } => tag.to_ascii_lowercase(),
            NodeKind::Fragment(_) => {
                return Err(DomError::Hierarchy("fragments have no content".to_string()))
            }
        };
        if tree.rejected_tags.contains(&tag) {
            return Err(DomError::AssignmentRejected {
                tag,
                reason: "unknown runtime error".to_string(),
            });
        }

        for child in tree.nodes[element.0].children.clone() {
            tree.detach(child);
        }
        for chunk in split_top_level(html) {
            let index = tree.push(NodeKind::Fragment(chunk));
            tree.nodes[index].parent = Some(element.0);
            tree.nodes[element.0].children.push(index);
        }
        Ok(())
    }

    fn child_nodes(&self, element: &NodeId) -> Vec<NodeId> {
        self.tree()
            .nodes
            .get(element.0)
            .map(|n| n.children.iter().copied().map(NodeId).collect())
            .unwrap_or_default()
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let mut tree = self.tree();
        if tree.node(*child)?.parent != Some(parent.0) {
            return Err(DomError::Hierarchy(format!(
                "node {} is not a child of node {}",
                child.0, parent.0
            )));
        }
        tree.detach(child.0);
        Ok(())
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let mut tree = self.tree();
        tree.node(*parent)?;
        tree.node(*child)?;
        if parent == child {
            return Err(DomError::Hierarchy("cannot append a node to itself".to_string()));
        }
        tree.detach(child.0);
        tree.nodes[child.0].parent = Some(parent.0);
        tree.nodes[parent.0].children.push(child.0);
        Ok(())
    }
}

/// Splits markup into top-level chunks: runs of text and whole elements.
///
/// Tags are balanced naively; void elements must be self-closed (`<br/>`).
fn split_top_level(html: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < html.len() {
        if html.as_bytes()[i] != b'<' {
            i += 1;
            continue;
        }
        let Some(offset) = html[i..].find('>') else {
            break;
        };
        let close = i + offset;
        let tag = &html[i + 1..close];

        if depth == 0 && i > start {
            parts.push(html[start..i].to_string());
            start = i;
        }
        if tag.starts_with('/') {
            depth = depth.saturating_sub(1);
        } else if !tag.ends_with('/') && !tag.starts_with('!') {
            depth += 1;
        }
        i = close + 1;
        if depth == 0 {
            parts.push(html[start..i].to_string());
            start = i;
        }
    }

    if start < html.len() {
        parts.push(html[start..].to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("hi <b>x</b><i><u>y</u></i><br/>tail"),
            vec!["hi ", "<b>x</b>", "<i><u>y</u></i>", "<br/>", "tail"]
        );
        assert!(split_top_level("").is_empty());
    }

    #[test]
    fn test_lookup_by_id() {
        let doc = MemoryDocument::new();
        let list = doc.insert_element("list", "ul");

        assert_eq!(doc.get_element_by_id("list"), Some(list));
        assert_eq!(doc.get_element_by_id("missing"), None);
        assert_eq!(doc.parent(&list), Some(doc.body()));
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let doc = MemoryDocument::new();
        let list = doc.insert_element("list", "ul");

        doc.set_inner_html(&list, "<li>a</li>").unwrap();
        doc.set_inner_html(&list, "<li>b</li><li>c</li>").unwrap();

        assert_eq!(doc.inner_html(&list), "<li>b</li><li>c</li>");
        assert_eq!(doc.child_nodes(&list).len(), 2);
    }

    #[test]
    fn test_rejected_tag() {
        let doc = MemoryDocument::new();
        let table = doc.insert_element("t", "TABLE");
        doc.reject_inner_html("table");

        assert!(matches!(
            doc.set_inner_html(&table, "<tr></tr>"),
            Err(DomError::AssignmentRejected { .. })
        ));
    }

    #[test]
    fn test_append_moves_node() {
        let doc = MemoryDocument::new();
        let from = doc.insert_element("from", "div");
        let to = doc.insert_element("to", "div");
        doc.set_inner_html(&from, "<p>1</p>").unwrap();

        let child = doc.child_nodes(&from)[0];
        doc.append_child(&to, &child).unwrap();

        assert!(doc.child_nodes(&from).is_empty());
        assert_eq!(doc.inner_html(&to), "<p>1</p>");
        assert!(doc.remove_child(&from, &child).is_err());
    }

    #[test]
    fn test_created_elements_render() {
        let doc = MemoryDocument::new();
        let main = doc.insert_element("main", "main");
        let div = doc.create_element("div").unwrap();
        doc.append_child(&main, &div).unwrap();

        assert_eq!(doc.inner_html(&main), "<div></div>");
        assert!(doc.inner_html(&doc.body()).starts_with("<main id=\"main\">"));
    }
}

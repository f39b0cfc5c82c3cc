//! Document tree for rendered slide decks.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. The tree is built once by a parser backend; after that the only
//! mutation callers need is editing element attributes.

/// Index of a node inside the [`Document`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena (creation order).
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single `name="value"` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An element node: tag name plus attributes in source order.
///
/// Class labels are not stored separately; they are the whitespace separated
/// tokens of the `class` attribute, so a serialized document always reflects
/// the current label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<Attribute>,
}

impl Element {
    /// Create an element with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Tag name as it was parsed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this element's tag name is `tag`, ignoring ASCII case.
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    /// Attributes in source order.
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Value of the attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    /// Class labels of this element.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Whether the element carries the class label `class` (case-sensitive).
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class label. Returns `false` if the label was already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }

        let value = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} {}", existing.trim_end(), class)
            }
            _ => class.to_string(),
        };
        self.set_attr("class", value);
        true
    }
}

/// Payload of a node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document root. Exactly one per document.
    Document,
    /// `<!DOCTYPE name>`.
    Doctype(String),
    Comment(String),
    Text(String),
    Element(Element),
}

/// A node and its links into the tree.
#[derive(Debug, Clone)]
pub struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The element payload, if this node is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// A mutable tree of nodes rooted at a [`NodeData::Document`] node.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always has its root node, so it is never truly empty;
    /// this reports whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Append a new node as the last child of `parent`.
    ///
    /// Returns `None` if `parent` does not belong to this document.
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> Option<NodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    /// Append an element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, element: Element) -> Option<NodeId> {
        self.append(parent, NodeData::Element(element))
    }

    /// Append a text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Option<NodeId> {
        self.append(parent, NodeData::Text(text.into()))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// The element at `id`, if `id` is an element of this document.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable access to the element at `id`.
    ///
    /// Only the element payload is exposed; tree links cannot be changed
    /// through it.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// Direct children of `id` that are elements, in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Element)> {
        self.get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&child| self.element(child).map(|e| (child, e)))
    }

    /// All nodes below `id` (excluding `id`) in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.get(id) {
            stack.extend(node.children.iter().rev().copied());
        }
        Descendants { doc: self, stack }
    }

    /// Every element in the document, in document order.
    pub fn elements(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.descendants(self.root())
            .filter_map(move |id| self.element(id).map(|e| (id, e)))
    }

    /// Elements carrying the class label `class`.
    pub fn elements_with_class<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = (NodeId, &'a Element)> + 'a {
        self.elements().filter(move |(_, e)| e.has_class(class))
    }

    /// Elements whose attribute `name` equals `value` exactly.
    pub fn elements_with_attr<'a>(
        &'a self,
        name: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = (NodeId, &'a Element)> + 'a {
        self.elements().filter(move |(_, e)| e.attr(name) == Some(value))
    }

    /// Concatenated text of all text nodes below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|child| match self.get(child).map(Node::data) {
                Some(NodeData::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Pre-order iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(node) = self.doc.get(id) {
            self.stack.extend(node.children.iter().rev().copied());
        }
        Some(id)
    }
}

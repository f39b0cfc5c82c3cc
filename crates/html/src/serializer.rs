//! HTML serialization of a [`Document`].
//!
//! Follows the HTML fragment serialization algorithm: void elements have no
//! end tag, raw text element content is written verbatim, and everything
//! else is escaped.

use reveal_core::{Document, NodeData, NodeId};

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Elements that drop a leading newline when parsed.
const NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// Serializer for annotated documents.
pub struct HtmlSerializer;

impl HtmlSerializer {
    /// Create a new HTML serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize the whole document.
    pub fn serialize(&self, document: &Document) -> String {
        self.serialize_children(document, document.root())
    }

    /// Serialize the children of `id`, excluding `id` itself.
    pub fn serialize_children(&self, document: &Document, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack: Vec<Step> = children_of(document, id)
            .iter()
            .rev()
            .map(|&child| Step::Open(child))
            .collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(node) => {
                    if self.open(document, node, &mut out) {
                        stack.push(Step::Close(node));
                        stack.extend(
                            children_of(document, node)
                                .iter()
                                .rev()
                                .map(|&child| Step::Open(child)),
                        );
                    }
                }
                Step::Close(node) => {
                    if let Some(element) = document.element(node) {
                        out.push_str("</");
                        out.push_str(element.name());
                        out.push('>');
                    }
                }
            }
        }

        out
    }

    /// Write the opening part of a node. Returns `true` if the node needs its
    /// children and end tag written.
    fn open(&self, document: &Document, id: NodeId, out: &mut String) -> bool {
        let Some(node) = document.get(id) else {
            return false;
        };

        match node.data() {
            NodeData::Document => true,
            NodeData::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
                false
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
                false
            }
            NodeData::Text(text) => {
                let raw = node
                    .parent()
                    .and_then(|p| document.element(p))
                    .is_some_and(|p| RAW_TEXT_ELEMENTS.iter().any(|tag| p.is(tag)));
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
                false
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(element.name());
                for attr in element.attrs() {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.iter().any(|tag| element.is(tag)) {
                    return false;
                }

                if NEWLINE_ELEMENTS.iter().any(|tag| element.is(tag)) {
                    let first = node.children().first().and_then(|&c| document.get(c));
                    if let Some(NodeData::Text(text)) = first.map(|n| n.data()) {
                        if text.starts_with('\n') {
                            out.push('\n');
                        }
                    }
                }
                true
            }
        }
    }
}

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

fn children_of(document: &Document, id: NodeId) -> &[NodeId] {
    document.get(id).map(|n| n.children()).unwrap_or(&[])
}

fn escape_into(text: &str, attr_mode: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

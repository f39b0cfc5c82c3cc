//! HTML parser implementation.

use reveal_core::{Document, Element, Error, NodeData, Result};
use scraper::{Html, Node};
use std::collections::HashMap;
use std::path::Path;

/// Parser for rendered HTML slide decks.
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a complete HTML document.
    ///
    /// html5ever recovers from malformed markup, so this never fails; the
    /// missing `html`, `head`, and `body` elements are implied as a browser
    /// would.
    pub fn parse_str(&self, html: &str) -> Document {
        let parsed = Html::parse_document(html);
        if !parsed.errors.is_empty() {
            log::debug!("Recovered from {} HTML parse errors", parsed.errors.len());
        }
        convert(&parsed, false)
    }

    /// Parse an HTML fragment, such as the body of a single slide.
    ///
    /// The top-level nodes of the fragment become children of the document
    /// root; no `html`/`body` wrapper is added.
    pub fn parse_fragment(&self, html: &str) -> Document {
        let parsed = Html::parse_fragment(html);
        convert(&parsed, true)
    }

    /// Parse HTML from raw bytes, which must be UTF-8.
    ///
    /// `origin` names the input in the error message.
    pub fn parse_bytes(&self, bytes: &[u8], origin: &str) -> Result<Document> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::InvalidEncoding(format!("{}: {}", origin, e)))?;
        Ok(self.parse_str(text))
    }

    /// Read and parse an HTML file.
    pub fn parse_file(&self, path: &Path) -> Result<Document> {
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes, &path.display().to_string())
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a scraper tree into a [`Document`].
///
/// With `unwrap_fragment`, the `html` element scraper wraps fragments in is
/// mapped onto the document root instead of being copied.
fn convert(html: &Html, unwrap_fragment: bool) -> Document {
    let mut document = Document::new();
    let mut ids = HashMap::new();

    let root = html.tree.root();
    ids.insert(root.id(), document.root());

    if unwrap_fragment {
        for child in root.children() {
            if matches!(child.value(), Node::Element(e) if e.name() == "html") {
                ids.insert(child.id(), document.root());
            }
        }
    }

    for node in root.descendants() {
        if ids.contains_key(&node.id()) {
            continue;
        }

        // Children of skipped nodes have no mapped parent and are dropped too.
        let Some(parent) = node.parent().and_then(|p| ids.get(&p.id()).copied()) else {
            continue;
        };

        let data = match node.value() {
            Node::Doctype(doctype) => NodeData::Doctype(doctype.name().to_string()),
            Node::Comment(comment) => NodeData::Comment((**comment).to_owned()),
            Node::Text(text) => NodeData::Text((**text).to_owned()),
            Node::Element(e) => {
                let mut element = Element::new(e.name());
                // Foreign attributes such as `xlink:href` keep their prefix.
                for (name, value) in e.attrs.iter() {
                    let qualified = match &name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, name.local),
                        None => name.local.to_string(),
                    };
                    element.set_attr(qualified, &**value);
                }
                NodeData::Element(element)
            }
            Node::Document | Node::Fragment | Node::ProcessingInstruction(_) => continue,
        };

        if let Some(id) = document.append(parent, data) {
            ids.insert(node.id(), id);
        }
    }

    document
}

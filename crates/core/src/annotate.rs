//! Step-reveal annotation.
//!
//! List items in the top-level list of a `data-reveal="1"` step are inner
//! steps: the presentation runtime reveals them one at a time. Items in nested
//! lists or in notes blocks are left alone, so matching only follows direct
//! children:
//!
//! ```text
//! .step[data-reveal="1"] > ul > li
//! .step[data-reveal="1"] > ol > li
//! ```

use crate::dom::{Document, NodeId};
use serde::Serialize;

/// Class label identifying a step container.
pub const STEP_CLASS: &str = "step";

/// Attribute that enables inner-step reveal on a step.
pub const REVEAL_ATTR: &str = "data-reveal";

/// Value of [`REVEAL_ATTR`] that enables inner-step reveal.
pub const REVEAL_VALUE: &str = "1";

/// List tags whose direct items become inner steps.
pub const LIST_TAGS: &[&str] = &["ul", "ol"];

/// Tag of a list item.
pub const ITEM_TAG: &str = "li";

/// Class label added to each matched list item.
pub const INNER_STEP_CLASS: &str = "innerStep";

/// The same match as a CSS selector, for engines that evaluate CSS directly.
///
/// Only the direct-child form is supported. The descendant form
/// `.step[data-reveal="1"] li` also labels nested lists and notes.
pub const STRICT_SELECTOR: &str =
    r#".step[data-reveal="1"] > ul > li, .step[data-reveal="1"] > ol > li"#;

/// Counts from a single annotation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    /// Step containers with reveal enabled.
    pub steps: usize,
    /// List items matching the pattern.
    pub matched: usize,
    /// Matched items that did not already carry the label.
    pub added: usize,
}

/// Marks inner-step list items in a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRevealAnnotator;

impl StepRevealAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Label every matching list item with [`INNER_STEP_CLASS`].
    ///
    /// Running this more than once leaves the document as after the first run.
    pub fn annotate(&self, document: &mut Document) {
        self.annotate_with_report(document);
    }

    /// Same as [`annotate`](Self::annotate), returning what the pass did.
    pub fn annotate_with_report(&self, document: &mut Document) -> AnnotationReport {
        let steps = self.reveal_steps(document);
        let items = self.items_of(document, &steps);

        let mut report = AnnotationReport {
            steps: steps.len(),
            matched: items.len(),
            added: 0,
        };

        for id in items {
            if let Some(item) = document.element_mut(id) {
                if item.add_class(INNER_STEP_CLASS) {
                    report.added += 1;
                }
            }
        }

        log::debug!(
            "Annotated {} steps: {} items matched, {} newly labeled",
            report.steps,
            report.matched,
            report.added
        );

        report
    }

    /// List items the pattern selects, in document order, without labeling.
    pub fn matches(&self, document: &Document) -> Vec<NodeId> {
        let steps = self.reveal_steps(document);
        self.items_of(document, &steps)
    }

    /// Step containers with `data-reveal="1"`.
    fn reveal_steps(&self, document: &Document) -> Vec<NodeId> {
        document
            .elements_with_class(STEP_CLASS)
            .filter(|(_, e)| e.attr(REVEAL_ATTR) == Some(REVEAL_VALUE))
            .map(|(id, _)| id)
            .collect()
    }

    /// `li` children of `ul`/`ol` children of each step.
    fn items_of(&self, document: &Document, steps: &[NodeId]) -> Vec<NodeId> {
        let mut items = Vec::new();

        for &step in steps {
            for (list, _) in document
                .element_children(step)
                .filter(|(_, e)| LIST_TAGS.iter().any(|tag| e.is(tag)))
            {
                items.extend(
                    document
                        .element_children(list)
                        .filter(|(_, e)| e.is(ITEM_TAG))
                        .map(|(id, _)| id),
                );
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Element, NodeData};

    fn step(doc: &mut Document, reveal: Option<&str>) -> NodeId {
        let mut div = Element::new("div").with_attr("class", "step");
        if let Some(value) = reveal {
            div.set_attr(REVEAL_ATTR, value);
        }
        let root = doc.root();
        doc.append_element(root, div).unwrap()
    }

    fn item(doc: &mut Document, list: NodeId, text: &str) -> NodeId {
        let li = doc.append_element(list, Element::new("li")).unwrap();
        doc.append_text(li, text).unwrap();
        li
    }

    fn labeled(doc: &Document) -> Vec<String> {
        doc.elements_with_class(INNER_STEP_CLASS)
            .map(|(id, _)| doc.text_content(id))
            .collect()
    }

    #[test]
    fn test_items_of_direct_list_are_labeled() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let ul = doc.append_element(s, Element::new("ul")).unwrap();
        item(&mut doc, ul, "A");
        item(&mut doc, ul, "B");

        StepRevealAnnotator::new().annotate(&mut doc);

        assert_eq!(labeled(&doc), vec!["A", "B"]);
    }

    #[test]
    fn test_nested_list_items_are_not_labeled() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let ul = doc.append_element(s, Element::new("ul")).unwrap();
        let outer = doc.append_element(ul, Element::new("li")).unwrap();
        doc.append_text(outer, "A").unwrap();
        let inner = doc.append_element(outer, Element::new("ul")).unwrap();
        let nested = item(&mut doc, inner, "Nested");

        StepRevealAnnotator::new().annotate(&mut doc);

        assert!(doc.element(outer).unwrap().has_class(INNER_STEP_CLASS));
        assert!(!doc.element(nested).unwrap().has_class(INNER_STEP_CLASS));
    }

    #[test]
    fn test_reveal_value_must_be_one() {
        for value in [Some("0"), Some(""), Some(" 1"), Some("true"), None] {
            let mut doc = Document::new();
            let s = step(&mut doc, value);
            let ul = doc.append_element(s, Element::new("ul")).unwrap();
            item(&mut doc, ul, "A");

            let report = StepRevealAnnotator::new().annotate_with_report(&mut doc);

            assert_eq!(report, AnnotationReport::default(), "data-reveal={:?}", value);
            assert!(labeled(&doc).is_empty());
        }
    }

    #[test]
    fn test_notes_block_is_not_labeled() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let notes = doc
            .append_element(s, Element::new("div").with_attr("class", "notes"))
            .unwrap();
        let ul = doc.append_element(notes, Element::new("ul")).unwrap();
        item(&mut doc, ul, "Remember to breathe");

        let report = StepRevealAnnotator::new().annotate_with_report(&mut doc);

        assert_eq!(report.steps, 1);
        assert_eq!(report.matched, 0);
        assert!(labeled(&doc).is_empty());
    }

    #[test]
    fn test_ordered_lists_are_supported() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let ol = doc.append_element(s, Element::new("OL")).unwrap();
        item(&mut doc, ol, "First");
        item(&mut doc, ol, "Second");

        StepRevealAnnotator::new().annotate(&mut doc);

        assert_eq!(labeled(&doc), vec!["First", "Second"]);
    }

    #[test]
    fn test_step_class_must_be_present() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc
            .append_element(
                root,
                Element::new("div")
                    .with_attr("class", "steps")
                    .with_attr(REVEAL_ATTR, "1"),
            )
            .unwrap();
        let ul = doc.append_element(div, Element::new("ul")).unwrap();
        item(&mut doc, ul, "A");

        assert!(StepRevealAnnotator::new().matches(&doc).is_empty());
    }

    #[test]
    fn test_non_item_children_of_list_are_skipped() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let ul = doc.append_element(s, Element::new("ul")).unwrap();
        doc.append(ul, NodeData::Comment("separator".into())).unwrap();
        let p = doc.append_element(ul, Element::new("p")).unwrap();
        let li = item(&mut doc, ul, "A");

        let matches = StepRevealAnnotator::new().matches(&doc);

        assert_eq!(matches, vec![li]);
        assert!(!matches.contains(&p));
    }

    #[test]
    fn test_annotate_is_idempotent() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let ul = doc.append_element(s, Element::new("ul")).unwrap();
        item(&mut doc, ul, "A");
        item(&mut doc, ul, "B");
        let annotator = StepRevealAnnotator::new();

        let first = annotator.annotate_with_report(&mut doc);
        let snapshot: Vec<_> = doc.elements().map(|(_, e)| e.clone()).collect();
        let second = annotator.annotate_with_report(&mut doc);
        let again: Vec<_> = doc.elements().map(|(_, e)| e.clone()).collect();

        assert_eq!(first.added, 2);
        assert_eq!(second.matched, 2);
        assert_eq!(second.added, 0);
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_existing_classes_are_kept() {
        let mut doc = Document::new();
        let s = step(&mut doc, Some("1"));
        let ul = doc.append_element(s, Element::new("ul")).unwrap();
        let li = doc
            .append_element(ul, Element::new("li").with_attr("class", "highlight"))
            .unwrap();

        StepRevealAnnotator::new().annotate(&mut doc);

        assert_eq!(
            doc.element(li).unwrap().attr("class"),
            Some("highlight innerStep")
        );
    }

    #[test]
    fn test_labeled_items_have_step_list_item_chain() {
        let mut doc = Document::new();
        let s1 = step(&mut doc, Some("1"));
        let s2 = step(&mut doc, Some("0"));
        for s in [s1, s2] {
            let ul = doc.append_element(s, Element::new("ul")).unwrap();
            let li = item(&mut doc, ul, "x");
            let sub = doc.append_element(li, Element::new("ol")).unwrap();
            item(&mut doc, sub, "y");
        }
        // A step nested inside an item still counts on its own.
        let ol = doc.append_element(s1, Element::new("ol")).unwrap();
        let host = item(&mut doc, ol, "host");
        let inner_step = doc
            .append_element(
                host,
                Element::new("section")
                    .with_attr("class", "step")
                    .with_attr(REVEAL_ATTR, "1"),
            )
            .unwrap();
        let ul = doc.append_element(inner_step, Element::new("ul")).unwrap();
        item(&mut doc, ul, "deep");

        StepRevealAnnotator::new().annotate(&mut doc);

        let parent = |id| doc.get(id).and_then(|n| n.parent()).unwrap();
        let all: Vec<_> = doc.elements_with_class(INNER_STEP_CLASS).collect();
        assert_eq!(all.len(), 3);
        for (id, li) in all {
            assert!(li.is("li"));
            let list = doc.element(parent(id)).unwrap();
            assert!(list.is("ul") || list.is("ol"));
            let container = doc.element(parent(parent(id))).unwrap();
            assert!(container.has_class(STEP_CLASS));
            assert_eq!(container.attr(REVEAL_ATTR), Some(REVEAL_VALUE));
        }
    }

    #[test]
    fn test_empty_document_is_noop() {
        let mut doc = Document::new();
        let report = StepRevealAnnotator::new().annotate_with_report(&mut doc);
        assert_eq!(report, AnnotationReport::default());
        assert_eq!(doc.len(), 1);
    }
}

//! HTML backend for step-reveal annotation.
//!
//! Parses rendered slide decks into the core document model with `scraper`
//! (html5ever) and serializes the annotated tree back to HTML.

pub mod parser;
pub mod serializer;

pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;

use reveal_core::{AnnotationReport, StepRevealAnnotator};

/// Parse `html`, annotate inner steps, and serialize the result.
pub fn annotate_html(html: &str) -> (String, AnnotationReport) {
    let mut document = HtmlParser::new().parse_str(html);
    let report = StepRevealAnnotator::new().annotate_with_report(&mut document);
    (HtmlSerializer::new().serialize(&document), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reveal_core::STRICT_SELECTOR;
    use scraper::{Html, Selector};

    const DECK: &str = r#"<!DOCTYPE html>
<html><head><title>Deck</title></head><body>
<div id="impress">
  <div class="step slide" data-reveal="1">
    <h1>Agenda</h1>
    <ul>
      <li>Intro<ul><li>Nested</li></ul></li>
      <li class="hl">Body</li>
    </ul>
    <ol><li>One</li></ol>
    <div class="notes"><ul><li>Speaker only</li></ul></div>
  </div>
  <div class="step" data-reveal="0"><ul><li>Static</li></ul></div>
  <div class="step"><ul><li>Plain</li></ul></div>
</div>
</body></html>"#;

    fn labeled_text(html: &str) -> Vec<String> {
        let parsed = Html::parse_document(html);
        let selector = Selector::parse("li.innerStep").unwrap();
        parsed
            .select(&selector)
            .map(|li| li.text().next().unwrap_or_default().to_string())
            .collect()
    }

    fn first_text(document: &reveal_core::Document, id: reveal_core::NodeId) -> Option<String> {
        let child = *document.get(id)?.children().first()?;
        match document.get(child)?.data() {
            reveal_core::NodeData::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_annotate_html_labels_top_level_items() {
        let (output, report) = annotate_html(DECK);

        assert_eq!(report.steps, 1);
        assert_eq!(report.matched, 3);
        assert_eq!(report.added, 3);
        assert_eq!(labeled_text(&output), vec!["Intro", "Body", "One"]);
        assert!(output.contains(r#"<li class="hl innerStep">Body</li>"#));
    }

    #[test]
    fn test_matches_agree_with_css_selector() {
        let parsed = Html::parse_document(DECK);
        let selector = Selector::parse(STRICT_SELECTOR).unwrap();
        let expected: Vec<String> = parsed
            .select(&selector)
            .map(|li| li.text().next().unwrap_or_default().to_string())
            .collect();

        let document = HtmlParser::new().parse_str(DECK);
        let found: Vec<String> = StepRevealAnnotator::new()
            .matches(&document)
            .into_iter()
            .filter_map(|id| first_text(&document, id))
            .collect();

        assert_eq!(found, expected);
    }

    #[test]
    fn test_descendant_selector_would_overlabel() {
        let parsed = Html::parse_document(DECK);
        let loose = Selector::parse(r#".step[data-reveal="1"] li"#).unwrap();
        let (output, report) = annotate_html(DECK);

        assert_eq!(parsed.select(&loose).count(), 5);
        assert_eq!(report.matched, 3);
        assert!(!labeled_text(&output).contains(&"Speaker only".to_string()));
        assert!(!labeled_text(&output).contains(&"Nested".to_string()));
    }

    #[test]
    fn test_annotate_html_is_idempotent() {
        let (once, _) = annotate_html(DECK);
        let (twice, report) = annotate_html(&once);

        assert_eq!(once, twice);
        assert_eq!(report.matched, 3);
        assert_eq!(report.added, 0);
    }

    #[test]
    fn test_document_without_steps_is_unchanged() {
        let html = "<!DOCTYPE html><html><head></head><body><ul><li>A</li></ul></body></html>";
        let (output, report) = annotate_html(html);

        assert_eq!(report, AnnotationReport::default());
        assert_eq!(output, html);
    }
}

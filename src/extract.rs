//! FAQ extraction from fetched HTML.
//!
//! Extraction is an ordered list of [`ExtractionStrategy`] implementations,
//! tried in turn until one yields at least one question/answer pair:
//!
//! 1. [`HeadingStrategy`]: each `h2`/`h3`/`h4` is a question; the text of the
//!    block siblings that immediately follow it is the answer.
//! 2. [`AccordionStrategy`]: site-compat shim for accordion widgets whose
//!    title/content elements are identified by class-name substrings.
//!
//! When no strategy finds anything, [`extract_entries`] emits one synthetic
//! entry holding the page's visible text, truncated to a bounded length, so a
//! successful fetch never produces an empty corpus.

use scraper::node::Node;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::models::FaqEntry;

/// A question and its answer, before ids and provenance are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// One way of finding FAQ pairs in a parsed document.
pub trait ExtractionStrategy: Send + Sync {
    /// Strategy identifier as used in `extraction.strategies`.
    fn name(&self) -> &str;

    fn extract(&self, document: &Html) -> Vec<QaPair>;
}

/// Heading-driven extraction.
pub struct HeadingStrategy {
    heading_tags: Vec<String>,
    answer_tags: Vec<String>,
}

impl Default for HeadingStrategy {
    fn default() -> Self {
        Self {
            heading_tags: ["h2", "h3", "h4"].map(String::from).to_vec(),
            answer_tags: ["p", "div", "ul", "ol", "span"].map(String::from).to_vec(),
        }
    }
}

impl ExtractionStrategy for HeadingStrategy {
    fn name(&self) -> &str {
        "headings"
    }

    fn extract(&self, document: &Html) -> Vec<QaPair> {
        let mut pairs = Vec::new();

        for heading in elements(document).filter(|el| has_tag(el, &self.heading_tags)) {
            let question = element_text(&heading);
            if question.is_empty() {
                continue;
            }

            let parts: Vec<String> = heading
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .take_while(|sib| has_tag(sib, &self.answer_tags))
                .map(|sib| element_text(&sib))
                .filter(|text| !text.is_empty())
                .collect();

            if !parts.is_empty() {
                pairs.push(QaPair {
                    question,
                    answer: parts.join(" "),
                });
            }
        }

        pairs
    }
}

/// Accordion-widget extraction keyed on class-name substrings.
///
/// Every `div`/`section` container is inspected for a title descendant
/// (class contains `title`) and a content descendant (class contains
/// `content` or `text`). Nested containers report the same pair more than
/// once, so pairs are de-duplicated in first-seen order.
pub struct AccordionStrategy {
    container_tags: Vec<String>,
    title_tags: Vec<String>,
    title_markers: Vec<String>,
    content_tags: Vec<String>,
    content_markers: Vec<String>,
}

impl Default for AccordionStrategy {
    fn default() -> Self {
        Self {
            container_tags: ["div", "section"].map(String::from).to_vec(),
            title_tags: ["h2", "h3", "h4", "div", "a"].map(String::from).to_vec(),
            title_markers: vec!["title".to_string()],
            content_tags: ["div", "p"].map(String::from).to_vec(),
            content_markers: ["content", "text"].map(String::from).to_vec(),
        }
    }
}

impl AccordionStrategy {
    fn find<'a>(
        &self,
        container: ElementRef<'a>,
        tags: &[String],
        markers: &[String],
    ) -> Option<ElementRef<'a>> {
        container
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| has_tag(el, tags) && class_contains(el, markers))
    }
}

impl ExtractionStrategy for AccordionStrategy {
    fn name(&self) -> &str {
        "accordion"
    }

    fn extract(&self, document: &Html) -> Vec<QaPair> {
        let mut pairs: Vec<QaPair> = Vec::new();

        for container in elements(document).filter(|el| has_tag(el, &self.container_tags)) {
            let Some(title) = self.find(container, &self.title_tags, &self.title_markers) else {
                continue;
            };
            let Some(content) = self.find(container, &self.content_tags, &self.content_markers)
            else {
                continue;
            };
            if title.id() == content.id() {
                continue;
            }

            let pair = QaPair {
                question: element_text(&title),
                answer: element_text(&content),
            };
            if pair.question.is_empty() || pair.answer.is_empty() || pairs.contains(&pair) {
                continue;
            }
            pairs.push(pair);
        }

        pairs
    }
}

/// Resolve strategy names from config into trait objects, preserving order.
pub fn strategies_from_config(config: &ExtractionConfig) -> Vec<Box<dyn ExtractionStrategy>> {
    config
        .strategies
        .iter()
        .filter_map(|name| -> Option<Box<dyn ExtractionStrategy>> {
            match name.as_str() {
                "headings" => Some(Box::new(HeadingStrategy::default())),
                "accordion" => Some(Box::new(AccordionStrategy::default())),
                _ => None,
            }
        })
        .collect()
}

/// Extract FAQ entries from an HTML page.
///
/// Ids are assigned densely from 0 in extraction order. Never returns an
/// empty list: see the module docs for the raw-text fallback.
pub fn extract_entries(
    html: &str,
    source_url: &str,
    strategies: &[Box<dyn ExtractionStrategy>],
    config: &ExtractionConfig,
) -> Vec<FaqEntry> {
    let document = Html::parse_document(html);

    let mut pairs = Vec::new();
    for strategy in strategies {
        pairs = strategy.extract(&document);
        if !pairs.is_empty() {
            info!(
                strategy = strategy.name(),
                count = pairs.len(),
                "extracted FAQ entries"
            );
            break;
        }
        debug!(strategy = strategy.name(), "strategy found no entries");
    }

    if pairs.is_empty() {
        let mut text = visible_text(&document, config.raw_text_limit);
        if text.is_empty() {
            text = format!("No readable content was found at {}", source_url);
        }
        info!(chars = text.chars().count(), "no structured FAQ found, using raw page text");
        pairs.push(QaPair {
            question: config.fallback_question.clone(),
            answer: text,
        });
    }

    pairs
        .into_iter()
        .enumerate()
        .map(|(id, pair)| FaqEntry {
            id,
            question: pair.question,
            answer: pair.answer,
            source_url: source_url.to_string(),
        })
        .collect()
}

// ============ DOM helpers ============

fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.root_element().descendants().filter_map(ElementRef::wrap)
}

fn has_tag(element: &ElementRef<'_>, tags: &[String]) -> bool {
    let name = element.value().name();
    tags.iter().any(|t| t == name)
}

fn class_contains(element: &ElementRef<'_>, markers: &[String]) -> bool {
    match element.value().attr("class") {
        Some(class) => {
            let class = class.to_lowercase();
            markers.iter().any(|m| class.contains(m.as_str()))
        }
        None => false,
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    let raw: Vec<&str> = element.text().collect();
    collapse_whitespace(&raw.join(" "))
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible page text, one text run per line, truncated to `limit` chars.
fn visible_text(document: &Html, limit: usize) -> String {
    let mut lines = Vec::new();
    collect_text(document.root_element(), &mut lines);
    lines.join("\n").chars().take(limit).collect()
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let line = collapse_whitespace(text);
                if !line.is_empty() {
                    out.push(line);
                }
            }
            Node::Element(el) if !HIDDEN_TAGS.contains(&el.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

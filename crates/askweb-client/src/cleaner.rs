use askweb_core::error::AppError;
use askweb_core::traits::Cleaner;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Elements whose content is never page text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

/// Elements that separate words even when the markup has no whitespace.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// Allow-nothing HTML cleaner.
///
/// No tag or attribute survives: only text is kept, whitespace runs (including
/// `&nbsp;`) collapse to a single ASCII space, and the characters that would
/// read as markup again (`&`, `<`, `>`) are entity-escaped. Cleaning its own
/// output is a no-op.
#[derive(Debug, Clone, Default)]
pub struct StrictCleaner;

impl StrictCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl Cleaner for StrictCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let document = Html::parse_document(html);
        let mut text = String::with_capacity(html.len() / 2);
        collect_text(document.root_element(), &mut text);

        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(escape_markup(&collapsed))
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push(' ');
                }
                collect_text(child_el, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

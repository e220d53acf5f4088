//! Finds the code blocks holding toplevel transcripts in homework pages.
//!
//! Two page layouts are recognized, matching the css selector
//! `div.code pre, pre code`:
//!
//! * a `<pre>` inside a `<div class="code">` (Fall 2018)
//! * a `<code>` inside a `<pre>` (Fall 2019 onwards)
//!
//! New layouts should be added alongside these so old pages keep working.

use std::path::Path;

use log::error;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::test::SourcePosition;

pub const CODE_BLOCK_SELECTOR: &str = "div.code pre, pre code";

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("tag pattern is valid")
});
static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("class pattern is valid")
});
// a `<` not followed by a tag name is text, as in `1 <> 2` or `a.(0) <- 1`
static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|</?[a-zA-Z][^>]*>").expect("markup pattern is valid"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// The text of one code block and where it starts in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub text: String,
    pub position: Option<SourcePosition>,
}

impl CodeBlock {
    pub fn new(text: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

struct OpenElement {
    name: String,
    is_code_div: bool,
    selected: bool,
    tag_start: usize,
    content_start: usize,
}

/// Extracts the text of every code block, in page order.
///
/// `file` names the page in the block positions.
pub fn extract_blocks(page: &str, file: Option<&Path>) -> Vec<CodeBlock> {
    let file = file.map(|f| f.display().to_string());
    let mut open: Vec<OpenElement> = Vec::new();
    let mut found: Vec<(usize, CodeBlock)> = Vec::new();

    for caps in TAG.captures_iter(page) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            // comment
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let attrs = caps.get(3).map_or("", |m| m.as_str());

        if closing {
            let Some(depth) = open.iter().rposition(|el| el.name == name) else {
                continue;
            };
            // unclosed children end with their parent
            for el in open.drain(depth..).rev() {
                if el.selected {
                    let text = block_text(&page[el.content_start..whole.start()]);
                    let position = position_of(page, el.tag_start, file.clone());
                    found.push((el.tag_start, CodeBlock::new(text, Some(position))));
                }
            }
            continue;
        }

        if VOID_ELEMENTS.contains(&name.as_str()) || attrs.trim_end().ends_with('/') {
            continue;
        }

        let selected = match name.as_str() {
            "pre" => open.iter().any(|el| el.is_code_div),
            "code" => open.iter().any(|el| el.name == "pre"),
            _ => false,
        };
        open.push(OpenElement {
            is_code_div: name == "div" && has_class(attrs, "code"),
            name,
            selected,
            tag_start: whole.start(),
            content_start: whole.end(),
        });
    }

    // blocks left open run to the end of the page
    for el in open.into_iter().filter(|el| el.selected) {
        let text = block_text(&page[el.content_start..]);
        let position = position_of(page, el.tag_start, file.clone());
        found.push((el.tag_start, CodeBlock::new(text, Some(position))));
    }

    if found.is_empty() {
        error!("Code block selector {:?} returned no matches", CODE_BLOCK_SELECTOR);
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, block)| block).collect()
}

fn has_class(attrs: &str, class: &str) -> bool {
    CLASS_ATTR.captures(attrs).is_some_and(|caps| {
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        value.split_whitespace().any(|c| c == class)
    })
}

/// The text content of a block's inner html.
fn block_text(inner: &str) -> String {
    let stripped = MARKUP.replace_all(inner, "");
    html_escape::decode_html_entities(&stripped).into_owned()
}

fn position_of(page: &str, offset: usize, file: Option<String>) -> SourcePosition {
    let before = &page[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    SourcePosition::new(line, Some(column), file)
}

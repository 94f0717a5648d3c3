//! Markup-to-text normalization for filing documents.
//!
//! Produces a flat stream of visible text: one text fragment per line, each
//! fragment whitespace-collapsed, with scripts, styles, hidden XBRL metadata
//! and layout tables removed.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::ops::Deref;
use tracing::{debug, warn};

static ANY_ELEMENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("universal selector"));

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9:_-]*(?:\s[^<>]*)?/?>").expect("markup tag regex")
});

static HIDDEN_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)display\s*:\s*none").expect("hidden style regex"));

const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "meta", "link", "title", "iframe",
    "frame", "frameset", "object", "embed", "header", "footer", "img", "svg", "ix:header",
];

/// Fragments shorter than this (in chars) are treated as noise.
const MIN_FRAGMENT_CHARS: usize = 2;

/// Visible filing text, one fragment per line, no markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for NormalizedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the input was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Document,
    Fragment,
    PlainText,
}

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: malformed markup degrades to lenient parsing, and input
    /// without any markup is normalized line by line.
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        self.normalize_with_mode(raw).0
    }

    pub fn normalize_with_mode(&self, raw: &str) -> (NormalizedText, ParseMode) {
        if raw.trim().is_empty() {
            warn!("Empty filing content provided for normalization");
            return (NormalizedText::default(), ParseMode::PlainText);
        }

        let (text, mode) = if MARKUP_TAG.is_match(raw) {
            self.normalize_markup(raw)
        } else {
            debug!("Input carries no markup, normalizing as plain text");
            (join_fragments(raw.lines()), ParseMode::PlainText)
        };

        if text.is_empty() {
            warn!(input_bytes = raw.len(), "No text extracted from filing markup");
        } else {
            debug!(chars = text.len(), mode = ?mode, "Normalized filing text");
        }

        (NormalizedText(text), mode)
    }

    fn normalize_markup(&self, raw: &str) -> (String, ParseMode) {
        let text = visible_text(Html::parse_document(raw));
        if !text.is_empty() {
            return (text, ParseMode::Document);
        }

        // Fragments wrapped in SGML envelopes lose their body under
        // document-mode tree construction; the fragment parser keeps them.
        debug!("Document parse yielded no visible text, retrying as fragment");
        (visible_text(Html::parse_fragment(raw)), ParseMode::Fragment)
    }
}

fn visible_text(mut document: Html) -> String {
    let doomed: Vec<_> = document
        .select(&ANY_ELEMENT)
        .filter(is_non_content)
        .map(|element| element.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    join_fragments(document.root_element().text())
}

fn is_non_content(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    let name = value.name();

    if NON_CONTENT_TAGS.contains(&name) {
        return true;
    }
    if value.attr("hidden").is_some() {
        return true;
    }
    if value
        .attr("style")
        .is_some_and(|style| HIDDEN_STYLE.is_match(style))
    {
        return true;
    }

    name == "table" && is_layout_table(element)
}

/// Presentational or navigational tables, by role/class metadata only.
fn is_layout_table(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value
        .attr("role")
        .is_some_and(|role| role.eq_ignore_ascii_case("presentation"))
    {
        return true;
    }
    value
        .classes()
        .any(|class| class.to_ascii_lowercase().contains("nav"))
}

fn join_fragments<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    fragments
        .into_iter()
        .map(strip_tags)
        .map(|fragment| collapse_whitespace(&fragment))
        .filter(|fragment| fragment.chars().count() >= MIN_FRAGMENT_CHARS)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes tag-shaped text, e.g. `<b>` decoded from `&lt;b&gt;`.
fn strip_tags(fragment: &str) -> std::borrow::Cow<'_, str> {
    MARKUP_TAG.replace_all(fragment, " ")
}

/// Collapses every whitespace run (including newlines, tabs and NBSP) to one space.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        TextNormalizer::new().normalize(raw).into_string()
    }

    #[test]
    fn test_extracts_visible_text_in_document_order() {
        let html = r#"
            <html>
              <head><title>aapl-20240928</title><style>p { color: red; }</style></head>
              <body>
                <p>First   paragraph
                   continues here.</p>
                <script>var tracking = 1;</script>
                <p>Second paragraph.</p>
              </body>
            </html>
        "#;

        assert_eq!(
            normalize(html),
            "First paragraph continues here.\nSecond paragraph."
        );
    }

    #[test]
    fn test_removes_hidden_elements_and_xbrl_header() {
        let html = r#"
            <html><body>
              <div style="display: none"><ix:header><ix:hidden>dei:EntityCentralIndexKey 0000320193</ix:hidden></ix:header></div>
              <div style="DISPLAY:NONE">Secret text</div>
              <ix:header>More metadata</ix:header>
              <p>Visible content.</p>
            </body></html>
        "#;

        let text = normalize(html);
        assert_eq!(text, "Visible content.");
    }

    #[test]
    fn test_removes_layout_tables_but_keeps_data_tables() {
        let html = r#"
            <html><body>
              <table role="presentation"><tr><td>Layout cell</td></tr></table>
              <table class="top-nav links"><tr><td>Home</td></tr></table>
              <table class="financial"><tr><td>Total revenue 391,035</td></tr></table>
            </body></html>
        "#;

        let text = normalize(html);
        assert!(!text.contains("Layout cell"));
        assert!(!text.contains("Home"));
        assert!(text.contains("Total revenue 391,035"));
    }

    #[test]
    fn test_removes_frames_headers_footers_and_images() {
        let html = r#"
            <html><body>
              <header>Site header</header>
              <iframe src="x">Frame body</iframe>
              <img src="logo.png" alt="logo">
              <p>Body text.</p>
              <footer>Page 3 of 120</footer>
            </body></html>
        "#;

        assert_eq!(normalize(html), "Body text.");
    }

    #[test]
    fn test_drops_single_character_fragments() {
        let html = "<html><body><p>Revenue</p><span>$</span><span>x</span><p>Net income</p></body></html>";
        assert_eq!(normalize(html), "Revenue\nNet income");
    }

    #[test]
    fn test_collapses_non_breaking_spaces() {
        let html = "<html><body><p>Item&#160;1A.&nbsp;&nbsp;Risk\tFactors</p></body></html>";
        assert_eq!(normalize(html), "Item 1A. Risk Factors");
    }

    #[test]
    fn test_empty_input_yields_empty_text() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_markup_without_visible_text_yields_empty_text() {
        assert_eq!(normalize("<html><body><script>x()</script></body></html>"), "");
    }

    #[test]
    fn test_plain_text_is_normalized_line_by_line() {
        let (text, mode) = TextNormalizer::new()
            .normalize_with_mode("ITEM 1A.   RISK FACTORS\n\n  We face   competition.\nx\n");
        assert_eq!(mode, ParseMode::PlainText);
        assert_eq!(text.as_str(), "ITEM 1A. RISK FACTORS\nWe face competition.");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let html = r#"
            <html><body>
              <p>Item 1A. Risk Factors</p>
              <p>Our   business is subject to   numerous risks, including R&amp;D delays.</p>
              <p>Item 7. Management&#8217;s Discussion and Analysis</p>
            </body></html>
        "#;

        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize(html);
        let twice = normalizer.normalize(once.as_str());
        assert!(!once.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_escaped_markup_is_stripped_and_stays_idempotent() {
        let html = "<html><body><p>Use the &lt;b&gt;bold&lt;/b&gt; tag sparingly.</p></body></html>";

        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize(html);
        let twice = normalizer.normalize(once.as_str());

        assert_eq!(once.as_str(), "Use the bold tag sparingly.");
        assert!(!MARKUP_TAG.is_match(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_output_has_no_markup_or_whitespace_runs() {
        let html = "<div><p>  Liquidity   and <b>Capital</b>\n Resources </p><br/><p>Cash  on hand</p></div>";
        let text = normalize(html);
        assert!(!MARKUP_TAG.is_match(&text));
        assert!(!text.contains("  "));
        assert!(!text.contains('\t'));
        for line in text.lines() {
            assert_eq!(line, line.trim());
        }
    }
}

//! Document text normalization.
//!
//! Filing documents arrive as HTML (often inline XBRL). Narrative extraction
//! only needs the visible prose, so markup is removed, entities decoded and
//! whitespace collapsed.

use html_escape::decode_html_entities;
use regex::Regex;
use std::sync::LazyLock;

static HIDDEN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("hidden block pattern should compile")
});

// Block-level elements separate words; inline ones (span, b, ix:*) do not.
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|br|hr|tr|td|th|thead|tbody|tfoot|table|caption|li|ul|ol|dl|dt|dd|h[1-6]|section|article|header|footer|main|nav|aside|blockquote|pre|body|html|head|title|center)\b[^>]*>",
    )
    .expect("block tag pattern should compile")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern should compile"));

// Unicode-aware, so decoded non-breaking spaces collapse too.
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

/// Converts a markup document into a single line of plain text.
///
/// Block-level tags become a space so adjacent cells do not run together.
/// Inline tags are removed outright, which keeps `<span>164</span>,000` a
/// single number. Character entities (named and numeric) are decoded and
/// every whitespace run becomes one space. Empty input yields empty output.
#[must_use]
pub fn strip_markup(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let text = HIDDEN_BLOCK.replace_all(markup, " ");
    let text = BLOCK_TAG.replace_all(&text, " ");
    let text = TAG.replace_all(&text, "");
    let text = decode_html_entities(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

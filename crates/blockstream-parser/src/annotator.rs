use blockstream_types::{ContentMetadata, ContentType};
use regex::Regex;
use std::sync::LazyLock;

use crate::state::ParseState;

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+\*\*|__[^_]+__").expect("valid regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[^*\s][^*]*\*").expect("valid regex"));
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~[^~]+~~").expect("valid regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]\([^)]+\)").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+\.)\s+\S").expect("valid regex"));

/// Computes the content type and metadata of a line
///
/// Reads only the fence state; block structure is the classifier's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAnnotator;

impl ContentAnnotator {
    pub fn new() -> Self {
        Self
    }

    pub fn annotate(&self, line: &str, state: &ParseState) -> (ContentType, ContentMetadata) {
        let mut metadata = ContentMetadata {
            word_count: line.split_whitespace().count(),
            char_count: line.chars().count(),
            line_count: 1,
            ..Default::default()
        };

        if state.in_code_block {
            metadata.language = state.code_language.clone();
            return (ContentType::Code, metadata);
        }

        let trimmed = line.trim();

        metadata.has_inline_code = INLINE_CODE.is_match(line);
        metadata.has_bold = BOLD.is_match(line);
        // Single-star spans that are not part of a double
        metadata.has_italic = ITALIC.is_match(&BOLD.replace_all(line, ""));
        metadata.has_strikethrough = STRIKETHROUGH.is_match(line);
        metadata.has_images = IMAGE.is_match(line);
        metadata.has_links = LINK.is_match(&IMAGE.replace_all(line, ""));
        metadata.has_lists = LIST_ITEM.is_match(line);
        metadata.has_tables = trimmed.len() >= 2
            && trimmed.starts_with('|')
            && trimmed.ends_with('|')
            && trimmed.matches('|').count() >= 2;
        metadata.has_quotes = trimmed.starts_with('>');
        metadata.has_formatting =
            metadata.has_bold || metadata.has_italic || metadata.has_strikethrough;

        (classify_content(&metadata), metadata)
    }
}

fn classify_content(metadata: &ContentMetadata) -> ContentType {
    if metadata.has_inline_code {
        ContentType::TextWithCode
    } else if metadata.has_formatting {
        ContentType::TextWithFormatting
    } else if metadata.has_links || metadata.has_images {
        ContentType::TextWithLinks
    } else if metadata.has_lists || metadata.has_tables || metadata.has_quotes {
        ContentType::Markdown
    } else {
        ContentType::PlainText
    }
}

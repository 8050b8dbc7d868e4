use serde::{Deserialize, Serialize};

use crate::block::BlockKind;

/// Rendering hint for a single line, independent of block structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    PlainText,
    Markdown,
    Code,
    TextWithFormatting,
    TextWithLinks,
    TextWithCode,
}

/// Counts and formatting flags computed for one line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub word_count: usize,
    pub char_count: usize,
    pub line_count: usize,
    pub has_formatting: bool,
    pub has_links: bool,
    pub has_inline_code: bool,
    pub has_images: bool,
    pub has_bold: bool,
    pub has_italic: bool,
    pub has_strikethrough: bool,
    pub has_lists: bool,
    pub has_tables: bool,
    pub has_quotes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Parse state snapshot attached to every content event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentContext {
    pub in_code_block: bool,
    #[serde(default)]
    pub code_language: Option<String>,
    pub in_table: bool,
    pub block_type: BlockKind,
}

impl Default for ContentContext {
    fn default() -> Self {
        Self {
            in_code_block: false,
            code_language: None,
            in_table: false,
            block_type: BlockKind::Paragraph,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural type of a rendered block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "heading_1")]
    Heading1,
    #[serde(rename = "heading_2")]
    Heading2,
    #[serde(rename = "heading_3")]
    Heading3,
    #[serde(rename = "heading_4")]
    Heading4,
    #[serde(rename = "heading_5")]
    Heading5,
    #[serde(rename = "heading_6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "code_block")]
    CodeBlock,
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem,
    #[serde(rename = "numbered_list_item")]
    NumberedListItem,
    #[serde(rename = "quote")]
    Quote,
    #[serde(rename = "divider")]
    Divider,
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "callout")]
    Callout,
}

impl BlockKind {
    /// Heading kind for a `#` run of length 1..=6
    pub fn heading(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Heading1),
            2 => Some(Self::Heading2),
            3 => Some(Self::Heading3),
            4 => Some(Self::Heading4),
            5 => Some(Self::Heading5),
            6 => Some(Self::Heading6),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading1 => "heading_1",
            Self::Heading2 => "heading_2",
            Self::Heading3 => "heading_3",
            Self::Heading4 => "heading_4",
            Self::Heading5 => "heading_5",
            Self::Heading6 => "heading_6",
            Self::Paragraph => "paragraph",
            Self::CodeBlock => "code_block",
            Self::BulletedListItem => "bulleted_list_item",
            Self::NumberedListItem => "numbered_list_item",
            Self::Quote => "quote",
            Self::Divider => "divider",
            Self::Table => "table",
            Self::Callout => "callout",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit lifecycle marker; only code fences carry one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockAction {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSubtype {
    Header,
    Row,
}

/// Line text, or the trimmed cells of a table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockContent {
    Text(String),
    Cells(Vec<String>),
}

impl BlockContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Cells(_) => None,
        }
    }

    pub fn as_cells(&self) -> Option<&[String]> {
        match self {
            Self::Cells(cells) => Some(cells),
            Self::Text(_) => None,
        }
    }
}

/// Type-specific block fields
///
/// Variant order matters for deserialization: the most specific field
/// sets come first and `Paragraph` (no fields) comes last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockMetadata {
    Heading {
        level: u8,
    },
    Code {
        language: String,
        syntax_highlighting: bool,
        executable: bool,
    },
    Table {
        column_count: usize,
        headers: Vec<String>,
        is_header: bool,
    },
    NumberedList {
        list_type: String,
        number: u64,
        indent: usize,
    },
    BulletedList {
        list_type: String,
        marker: char,
        indent: usize,
    },
    Divider {
        style: String,
        marker: char,
    },
    Callout {
        callout_type: String,
    },
    Quote {
        quote_style: String,
    },
    Paragraph {},
}

/// One classified line, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<TableSubtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<BlockAction>,
    pub content: BlockContent,
    pub metadata: BlockMetadata,
}

impl BlockDescriptor {
    pub fn is_end(&self) -> bool {
        self.action == Some(BlockAction::End)
    }

    /// Descriptors without an id of their own continue the open block
    pub fn is_continuation(&self) -> bool {
        self.block_id.is_none() && !self.is_end()
    }
}

/// Table row payload attached to content events for rows of an open table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub column_count: usize,
    pub headers: Vec<String>,
}

impl TableRow {
    /// Build the row payload from a `subtype=row` descriptor
    pub fn from_descriptor(descriptor: &BlockDescriptor) -> Option<Self> {
        if descriptor.subtype != Some(TableSubtype::Row) {
            return None;
        }
        let cells = descriptor.content.as_cells()?.to_vec();
        let headers = match &descriptor.metadata {
            BlockMetadata::Table { headers, .. } => headers.clone(),
            _ => Vec::new(),
        };
        Some(Self {
            column_count: cells.len(),
            cells,
            headers,
        })
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::block::{BlockDescriptor, BlockKind, TableRow};
use crate::content::{ContentContext, ContentMetadata, ContentType};

/// Event emitted to the downstream renderer, one JSON object per SSE record
///
/// `BlockStart`/`BlockEnd` never nest: at most one block is open at a time.
/// `End` is terminal and appears exactly once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Conversation identifier issued once for a new conversation
    Checkpoint {
        checkpoint_id: String,
    },

    /// A new block opened; carries the annotation of its opening line
    BlockStart {
        block_info: BlockDescriptor,
        content_type: ContentType,
        content_metadata: ContentMetadata,
    },

    /// The open block closed
    BlockEnd {
        block_id: String,
        block_type: BlockKind,
    },

    /// One complete, non-empty line
    Content {
        content: String,
        content_type: ContentType,
        content_metadata: ContentMetadata,
        #[serde(flatten)]
        context: ContentContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_row: Option<TableRow>,
    },

    /// Advisory preview of an unterminated fragment
    ContentChunk {
        content: String,
        content_type: ContentType,
        content_metadata: ContentMetadata,
        #[serde(flatten)]
        context: ContentContext,
    },

    /// Empty line; also the paragraph separator
    LineBreak,

    /// Upstream started a web search
    SearchStart {
        query: String,
    },

    /// Upstream search finished
    SearchResults {
        urls: Vec<String>,
        results: Vec<SearchResult>,
        result_count: usize,
    },

    /// Upstream failure; always followed by `End`
    Error {
        message: String,
    },

    /// Terminal event
    End {
        status: SessionStatus,
        summary: SessionSummary,
    },
}

impl StreamEvent {
    /// Wire name of the event, as found in its `type` field
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Checkpoint { .. } => "checkpoint",
            Self::BlockStart { .. } => "block_start",
            Self::BlockEnd { .. } => "block_end",
            Self::Content { .. } => "content",
            Self::ContentChunk { .. } => "content_chunk",
            Self::LineBreak => "line_break",
            Self::SearchStart { .. } => "search_start",
            Self::SearchResults { .. } => "search_results",
            Self::Error { .. } => "error",
            Self::End { .. } => "end",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. })
    }

    pub fn search_results(results: Vec<SearchResult>) -> Self {
        Self::SearchResults {
            urls: results.iter().map(|r| r.url.clone()).collect(),
            result_count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            snippet: String::new(),
            score: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Cancelled,
    Error,
}

/// Session totals, produced once at the end of the stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_blocks: u64,
    pub content_types: BTreeSet<ContentType>,
    pub had_code_blocks: bool,
    pub had_tables: bool,
    pub total_words: u64,
    pub total_chars: u64,
}

use blockstream_types::{BlockKind, ContentType, SessionSummary, StreamEvent};
use std::collections::BTreeSet;

/// Session totals, folded from the events the parser has already emitted
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    content_types: BTreeSet<ContentType>,
    had_code_blocks: bool,
    had_tables: bool,
    total_words: u64,
    total_chars: u64,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::BlockStart { block_info, .. } => match block_info.kind {
                BlockKind::CodeBlock => self.had_code_blocks = true,
                BlockKind::Table => self.had_tables = true,
                _ => {}
            },
            StreamEvent::Content {
                content_type,
                content_metadata,
                ..
            } => {
                self.content_types.insert(*content_type);
                self.total_words += content_metadata.word_count as u64;
                self.total_chars += content_metadata.char_count as u64;
            }
            _ => {}
        }
    }

    /// `total_blocks` is the classifier's id counter
    pub fn summary(&self, total_blocks: u64) -> SessionSummary {
        SessionSummary {
            total_blocks,
            content_types: self.content_types.clone(),
            had_code_blocks: self.had_code_blocks,
            had_tables: self.had_tables,
            total_words: self.total_words,
            total_chars: self.total_chars,
        }
    }
}

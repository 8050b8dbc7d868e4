use blockstream_types::{
    BlockKind, ContentContext, SessionStatus, SessionSummary, StreamEvent, TableRow,
};

use crate::aggregator::SessionAggregator;
use crate::annotator::ContentAnnotator;
use crate::classifier::BlockClassifier;
use crate::config::ParserConfig;
use crate::error::{ParseError, Result};
use crate::lifecycle::BlockLifecycleManager;
use crate::state::ParseState;

/// Incremental markdown-to-block parser for one streaming session
///
/// A synchronous fold over text fragments: each call to [`push`](Self::push)
/// returns the events completed by that fragment, in order. [`finish`](Self::finish)
/// flushes the tail, closes the open block and emits the terminal `end` event.
#[derive(Debug)]
pub struct StreamParser {
    config: ParserConfig,
    state: ParseState,
    classifier: BlockClassifier,
    annotator: ContentAnnotator,
    lifecycle: BlockLifecycleManager,
    aggregator: SessionAggregator,
    finished: bool,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl StreamParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            classifier: BlockClassifier::new(&config),
            config,
            state: ParseState::new(),
            annotator: ContentAnnotator::new(),
            lifecycle: BlockLifecycleManager::new(),
            aggregator: SessionAggregator::new(),
            finished: false,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Summary of everything seen so far
    pub fn summary(&self) -> SessionSummary {
        self.aggregator.summary(self.state.block_counter)
    }

    /// Ingest one fragment and return the events it completed
    pub fn push(&mut self, fragment: &str) -> Result<Vec<StreamEvent>> {
        if self.finished {
            tracing::warn!(len = fragment.len(), "Fragment received after session end");
            return Err(ParseError::SessionFinished);
        }

        let lines = self.state.line_buffer.ingest(fragment);
        let mut events = Vec::new();

        if lines.is_empty() {
            if self.config.preview_partial_lines && !fragment.trim().is_empty() {
                events.push(self.preview(fragment));
            }
            return Ok(events);
        }

        for line in &lines {
            self.process_line(line, &mut events);
        }
        Ok(events)
    }

    /// End the session normally
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        self.finish_with_status(SessionStatus::Completed)
    }

    /// Flush the pending tail as if newline-terminated, close the open block
    /// and emit the summary. Calling it again returns no events.
    pub fn finish_with_status(&mut self, status: SessionStatus) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(line) = self.state.line_buffer.flush() {
            self.process_line(&line, &mut events);
        }
        if let Some(event) = self.lifecycle.close(&mut self.state) {
            self.emit(event, &mut events);
        }

        let summary = self.summary();
        tracing::info!(
            status = ?status,
            total_blocks = summary.total_blocks,
            total_words = summary.total_words,
            "Stream parsing finished"
        );
        events.push(StreamEvent::End { status, summary });
        self.finished = true;

        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        if line.trim().is_empty() {
            self.emit(StreamEvent::LineBreak, events);
            return;
        }

        let descriptor = self.classifier.classify(line, &mut self.state);
        let (content_type, content_metadata) = self.annotator.annotate(line, &self.state);

        for event in self.lifecycle.apply(
            &mut self.state,
            descriptor.as_ref(),
            content_type,
            &content_metadata,
        ) {
            self.emit(event, events);
        }

        // Fence markers are structural only
        let is_fence_marker = descriptor
            .as_ref()
            .is_some_and(|d| d.kind == BlockKind::CodeBlock && d.action.is_some());
        if is_fence_marker {
            return;
        }

        let table_row = descriptor.as_ref().and_then(TableRow::from_descriptor);
        let event = StreamEvent::Content {
            content: line.to_string(),
            content_type,
            content_metadata,
            context: self.context(),
            table_row,
        };
        self.emit(event, events);
    }

    fn preview(&self, fragment: &str) -> StreamEvent {
        let (content_type, content_metadata) = self.annotator.annotate(fragment, &self.state);
        StreamEvent::ContentChunk {
            content: fragment.to_string(),
            content_type,
            content_metadata,
            context: self.context(),
        }
    }

    /// Fence and table state plus the enclosing block, `paragraph` when none is open
    fn context(&self) -> ContentContext {
        let block_type = self
            .state
            .current_block
            .as_ref()
            .map_or(BlockKind::Paragraph, |b| b.kind);

        ContentContext {
            in_code_block: self.state.in_code_block,
            code_language: self
                .state
                .in_code_block
                .then(|| self.state.code_language.clone())
                .flatten(),
            in_table: self.state.in_table,
            block_type,
        }
    }

    fn emit(&mut self, event: StreamEvent, events: &mut Vec<StreamEvent>) {
        self.aggregator.observe(&event);
        events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstream_types::ContentType;

    fn names(events: &[StreamEvent]) -> Vec<&'static str> {
        events.iter().map(StreamEvent::event_type).collect()
    }

    #[test]
    fn test_partial_fragment_emits_nothing() {
        let mut parser = StreamParser::default();
        assert!(parser.push("# Hel").unwrap().is_empty());
        assert_eq!(parser.state().line_buffer.pending(), "# Hel");
    }

    #[test]
    fn test_heading_streaming() {
        let mut parser = StreamParser::default();

        parser.push("# Hel").unwrap();
        let events = parser.push("lo\n").unwrap();
        assert_eq!(names(&events), vec!["block_start", "content"]);

        match &events[1] {
            StreamEvent::Content { content, context, .. } => {
                assert_eq!(content, "# Hello");
                assert_eq!(context.block_type, BlockKind::Heading1);
            }
            _ => panic!("Expected Content variant"),
        }
    }

    #[test]
    fn test_code_lines_carry_language() {
        let mut parser = StreamParser::default();
        let events = parser.push("```rs\nfn main() {}\n").unwrap();
        assert_eq!(names(&events), vec!["block_start", "content"]);

        match &events[1] {
            StreamEvent::Content {
                content_type,
                context,
                content_metadata,
                ..
            } => {
                assert_eq!(*content_type, ContentType::Code);
                assert!(context.in_code_block);
                assert_eq!(context.code_language.as_deref(), Some("rs"));
                assert_eq!(context.block_type, BlockKind::CodeBlock);
                assert_eq!(content_metadata.language.as_deref(), Some("rs"));
            }
            _ => panic!("Expected Content variant"),
        }
    }

    #[test]
    fn test_context_reports_enclosing_block() {
        let mut parser = StreamParser::default();
        let events = parser.push("# Hello\n\nWorld\n").unwrap();
        assert_eq!(names(&events), vec!["block_start", "content", "line_break", "content"]);

        match &events[3] {
            StreamEvent::Content { content, context, .. } => {
                assert_eq!(content, "World");
                assert_eq!(context.block_type, BlockKind::Heading1);
            }
            _ => panic!("Expected Content variant"),
        }

        let mut parser = StreamParser::default();
        let events = parser.push("loose line\n").unwrap();
        match &events[0] {
            StreamEvent::Content { context, .. } => {
                assert_eq!(context.block_type, BlockKind::Paragraph)
            }
            _ => panic!("Expected Content variant"),
        }
    }

    #[test]
    fn test_prose_after_table_leaves_the_table() {
        let mut parser = StreamParser::default();
        let events = parser
            .push("| a | b |\n| 1 | 2 |\nafter the table\nmore prose\n")
            .unwrap();
        assert_eq!(
            names(&events),
            vec!["block_start", "content", "content", "block_end", "content", "content"]
        );

        match &events[4] {
            StreamEvent::Content { content, context, .. } => {
                assert_eq!(content, "after the table");
                assert!(!context.in_table);
                assert_eq!(context.block_type, BlockKind::Paragraph);
            }
            _ => panic!("Expected Content variant"),
        }
        assert_eq!(names(&parser.finish()), vec!["end"]);
    }

    #[test]
    fn test_crlf_keeps_every_character() {
        let mut parser = StreamParser::default();
        let events = parser.push("abc\r\n\r\n").unwrap();
        assert_eq!(names(&events), vec!["content", "line_break"]);

        match &events[0] {
            StreamEvent::Content { content, content_metadata, .. } => {
                assert_eq!(content, "abc\r");
                assert_eq!(content_metadata.char_count, 4);
                assert_eq!(content_metadata.word_count, 1);
            }
            _ => panic!("Expected Content variant"),
        }
    }

    #[test]
    fn test_finish_closes_unterminated_fence() {
        let mut parser = StreamParser::default();
        parser.push("```\nloop {}").unwrap();

        let events = parser.finish();
        assert_eq!(names(&events), vec!["content", "block_end", "end"]);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut parser = StreamParser::default();
        parser.push("tail without newline").unwrap();

        let first = parser.finish();
        assert_eq!(names(&first), vec!["content", "end"]);
        assert!(parser.finish().is_empty());
        assert!(parser.is_finished());
        assert_eq!(parser.push("more\n"), Err(ParseError::SessionFinished));
    }

    #[test]
    fn test_partial_previews() {
        let mut parser = StreamParser::new(ParserConfig::new().with_partial_previews(true));

        assert!(parser.push("  ").unwrap().is_empty());
        let events = parser.push("**bo").unwrap();
        assert_eq!(names(&events), vec!["content_chunk"]);

        let events = parser.push("ld**\n").unwrap();
        assert_eq!(names(&events), vec!["content"]);

        // Previews never count towards the summary
        let summary = parser.summary();
        assert_eq!(summary.total_words, 1);
    }

    #[test]
    fn test_cancelled_status() {
        let mut parser = StreamParser::default();
        parser.push("- one\n").unwrap();

        let events = parser.finish_with_status(SessionStatus::Cancelled);
        match events.last() {
            Some(StreamEvent::End { status, summary }) => {
                assert_eq!(*status, SessionStatus::Cancelled);
                assert_eq!(summary.total_blocks, 1);
            }
            other => panic!("Expected End event, got {:?}", other),
        }
    }
}

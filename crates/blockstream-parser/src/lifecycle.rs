use blockstream_types::{BlockDescriptor, BlockKind, ContentMetadata, ContentType, StreamEvent};

use crate::state::ParseState;

/// Turns block descriptors into a flat sequence of start/end events
///
/// At most one block is open at a time (`ParseState::current_block`).
/// Opening a block with a different id first closes the previous one.
/// Descriptors without an id of their own (table rows, unnumbered
/// paragraphs) continue the open block and emit nothing, except that an
/// open table is closed once the table state has been cleared.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLifecycleManager;

impl BlockLifecycleManager {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(
        &self,
        state: &mut ParseState,
        descriptor: Option<&BlockDescriptor>,
        content_type: ContentType,
        content_metadata: &ContentMetadata,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        // The classifier already cleared the table state for this line
        let table_ended = !state.in_table
            && state
                .current_block
                .as_ref()
                .is_some_and(|open| open.kind == BlockKind::Table);
        if table_ended {
            events.extend(self.close(state));
        }

        let Some(descriptor) = descriptor else {
            return events;
        };

        if descriptor.is_end() {
            match self.close(state) {
                Some(event) => events.push(event),
                None => tracing::warn!(block_type = %descriptor.kind, "End marker with no open block"),
            }
            return events;
        }

        if descriptor.is_continuation() {
            return events;
        }

        let switching = state
            .current_block
            .as_ref()
            .is_some_and(|open| open.block_id != descriptor.block_id);
        if switching {
            events.extend(self.close(state));
        }

        tracing::debug!(
            block_id = descriptor.block_id.as_deref().unwrap_or_default(),
            block_type = %descriptor.kind,
            "Block started"
        );
        events.push(StreamEvent::BlockStart {
            block_info: descriptor.clone(),
            content_type,
            content_metadata: content_metadata.clone(),
        });
        state.current_block = Some(descriptor.clone());

        events
    }

    /// Close the open block, if any
    pub fn close(&self, state: &mut ParseState) -> Option<StreamEvent> {
        let open = state.current_block.take()?;
        let block_id = open.block_id.unwrap_or_default();
        tracing::debug!(block_id = %block_id, block_type = %open.kind, "Block ended");

        Some(StreamEvent::BlockEnd {
            block_id,
            block_type: open.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::BlockClassifier;

    fn run(lines: &[&str]) -> Vec<StreamEvent> {
        let classifier = BlockClassifier::default();
        let lifecycle = BlockLifecycleManager::new();
        let mut state = ParseState::new();

        lines
            .iter()
            .flat_map(|line| {
                let descriptor = classifier.classify(line, &mut state);
                lifecycle.apply(
                    &mut state,
                    descriptor.as_ref(),
                    ContentType::PlainText,
                    &ContentMetadata::default(),
                )
            })
            .collect()
    }

    fn names(events: &[StreamEvent]) -> Vec<&'static str> {
        events.iter().map(StreamEvent::event_type).collect()
    }

    #[test]
    fn test_new_block_closes_previous() {
        let events = run(&["# Title", "- item"]);
        assert_eq!(names(&events), vec!["block_start", "block_end", "block_start"]);

        match &events[1] {
            StreamEvent::BlockEnd { block_type, .. } => assert_eq!(*block_type, BlockKind::Heading1),
            _ => panic!("Expected BlockEnd variant"),
        }
    }

    #[test]
    fn test_fence_pair() {
        let events = run(&["```python", "x = 1", "# comment", "```"]);
        assert_eq!(names(&events), vec!["block_start", "block_end"]);

        let (StreamEvent::BlockStart { block_info, .. }, StreamEvent::BlockEnd { block_id, .. }) =
            (&events[0], &events[1])
        else {
            panic!("Expected BlockStart then BlockEnd");
        };
        assert_eq!(block_info.block_id.as_deref(), Some(block_id.as_str()));
    }

    #[test]
    fn test_table_rows_do_not_cycle_the_block() {
        let events = run(&["| a | b |", "| 1 | 2 |", "| 3 | 4 |"]);
        assert_eq!(names(&events), vec!["block_start"]);
    }

    #[test]
    fn test_prose_after_table_closes_it() {
        let events = run(&["| a | b |", "| 1 | 2 |", "after", "more"]);
        assert_eq!(names(&events), vec!["block_start", "block_end"]);

        match &events[1] {
            StreamEvent::BlockEnd { block_type, .. } => assert_eq!(*block_type, BlockKind::Table),
            _ => panic!("Expected BlockEnd variant"),
        }
    }

    #[test]
    fn test_heading_after_table_closes_it_once() {
        let events = run(&["| a | b |", "| 1 | 2 |", "## Next"]);
        assert_eq!(names(&events), vec!["block_start", "block_end", "block_start"]);
    }

    #[test]
    fn test_close_without_open_block() {
        let mut state = ParseState::new();
        assert!(BlockLifecycleManager::new().close(&mut state).is_none());
    }
}

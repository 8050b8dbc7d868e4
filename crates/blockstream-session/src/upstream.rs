use async_trait::async_trait;
use blockstream_types::SearchResult;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::{Result, SessionError};

/// Signal from the upstream text generator / tool-calling loop
///
/// Only `Text` is parsed; the others are relayed to the consumer verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpstreamEvent {
    /// Conversation identifier, issued once at session start
    Checkpoint {
        checkpoint_id: String,
    },

    /// Text fragment at arbitrary, sub-line granularity
    Text {
        content: String,
    },

    /// Tool invocation started (at most once per turn)
    SearchStart {
        query: String,
    },

    /// Tool invocation finished
    SearchResults {
        results: Vec<SearchResult>,
    },

    /// Upstream producer failed; ends the session
    Error {
        message: String,
    },
}

impl UpstreamEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Decode one upstream record. Records with an absent or non-string
    /// `content` are rejected rather than coerced.
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| SessionError::MalformedChunk(e.to_string()))
    }
}

pub type UpstreamStream = Pin<Box<dyn Stream<Item = Result<UpstreamEvent>> + Send>>;

/// One conversational turn requested from the upstream collaborator
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub message: String,
    /// `None` starts a new conversation
    pub checkpoint_id: Option<String>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            checkpoint_id: None,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint_id: impl Into<String>) -> Self {
        self.checkpoint_id = Some(checkpoint_id.into());
        self
    }

    pub fn is_new_conversation(&self) -> bool {
        self.checkpoint_id.is_none()
    }
}

/// Producer of upstream signals for a turn
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn open(&self, request: TurnRequest) -> Result<UpstreamStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_record() {
        let event = UpstreamEvent::from_json(r##"{"type":"text","content":"# Hi"}"##).unwrap();
        assert_eq!(event, UpstreamEvent::text("# Hi"));
    }

    #[test]
    fn test_missing_content_fails_fast() {
        let err = UpstreamEvent::from_json(r#"{"type":"text"}"#).unwrap_err();
        assert!(matches!(err, SessionError::MalformedChunk(_)));
    }

    #[test]
    fn test_non_string_content_fails_fast() {
        let err = UpstreamEvent::from_json(r#"{"type":"text","content":42}"#).unwrap_err();
        assert!(matches!(err, SessionError::MalformedChunk(_)));

        let err = UpstreamEvent::from_json(r#"{"type":"text","content":null}"#).unwrap_err();
        assert!(matches!(err, SessionError::MalformedChunk(_)));
    }

    #[test]
    fn test_search_results_record() {
        let event = UpstreamEvent::from_json(
            r#"{"type":"search_results","results":[{"url":"https://x.example","title":"X","snippet":"s","score":0.5}]}"#,
        )
        .unwrap();

        match event {
            UpstreamEvent::SearchResults { results } => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].score, Some(0.5));
            }
            _ => panic!("Expected SearchResults variant"),
        }
    }

    #[test]
    fn test_turn_request() {
        assert!(TurnRequest::new("hi").is_new_conversation());
        assert!(!TurnRequest::new("hi").with_checkpoint("abc").is_new_conversation());
    }
}

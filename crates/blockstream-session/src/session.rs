use blockstream_parser::{ParserConfig, StreamParser};
use blockstream_types::{SessionStatus, StreamEvent};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use crate::upstream::{UpstreamEvent, UpstreamStream};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

/// Interleaves relayed upstream signals with the parser's own events
struct Relay {
    parser: StreamParser,
    search_started: bool,
}

impl Relay {
    fn new(config: ParserConfig) -> Self {
        Self {
            parser: StreamParser::new(config),
            search_started: false,
        }
    }

    fn is_finished(&self) -> bool {
        self.parser.is_finished()
    }

    fn on_upstream(&mut self, event: UpstreamEvent) -> Vec<StreamEvent> {
        match event {
            UpstreamEvent::Checkpoint { checkpoint_id } => {
                vec![StreamEvent::Checkpoint { checkpoint_id }]
            }
            UpstreamEvent::Text { content } => match self.parser.push(&content) {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("Dropping fragment: {}", e);
                    Vec::new()
                }
            },
            UpstreamEvent::SearchStart { query } => {
                if self.search_started {
                    tracing::warn!(query = %query, "Second search_start in one turn");
                }
                self.search_started = true;
                vec![StreamEvent::SearchStart { query }]
            }
            UpstreamEvent::SearchResults { results } => {
                vec![StreamEvent::search_results(results)]
            }
            UpstreamEvent::Error { message } => self.fail(message),
        }
    }

    /// Upstream failure: flush, close, then `error` right before `end`
    fn fail(&mut self, message: String) -> Vec<StreamEvent> {
        tracing::error!("Upstream failed: {}", message);
        let mut events = self.parser.finish_with_status(SessionStatus::Error);
        if let Some(end) = events.pop() {
            events.push(StreamEvent::Error { message });
            events.push(end);
        }
        events
    }

    fn finish(&mut self, status: SessionStatus) -> Vec<StreamEvent> {
        self.parser.finish_with_status(status)
    }
}

/// Running session: ordered event receiver plus a cancel trigger
pub struct SessionHandle {
    events: mpsc::Receiver<StreamEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    /// Stop consuming upstream. The session still flushes its pending line,
    /// closes the open block and ends with status `cancelled`.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Collect every remaining event up to and including `end`
    pub async fn collect(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }

    pub fn into_stream(self) -> ReceiverStream<StreamEvent> {
        ReceiverStream::new(self.events)
    }
}

/// Drives one streaming session from upstream signals to downstream events
#[derive(Debug, Clone, Default)]
pub struct StreamSession {
    config: SessionConfig,
}

impl StreamSession {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fold the upstream into an event stream that always ends with `end`
    pub fn run(&self, upstream: UpstreamStream) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
        let mut relay = Relay::new(self.config.parser.clone());

        Box::pin(async_stream::stream! {
            let mut upstream = upstream;
            tracing::info!("Session started");

            while let Some(item) = upstream.next().await {
                let events = match item {
                    Ok(event) => relay.on_upstream(event),
                    Err(e) => relay.fail(e.to_string()),
                };
                for event in events {
                    yield event;
                }
                if relay.is_finished() {
                    break;
                }
            }

            // Empty if the session already ended on an upstream error
            for event in relay.finish(SessionStatus::Completed) {
                yield event;
            }
        })
    }

    /// Spawn the session on the runtime; events arrive in order on the handle
    pub fn spawn(&self, upstream: UpstreamStream) -> SessionHandle {
        // A deserialized config can carry 0, which mpsc rejects
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let mut relay = Relay::new(self.config.parser.clone());

        tokio::spawn(async move {
            let mut upstream = upstream;
            let mut cancel_armed = true;
            tracing::info!("Session spawned");

            loop {
                let events = tokio::select! {
                    biased;

                    signal = &mut cancel_rx, if cancel_armed => match signal {
                        Ok(()) => {
                            tracing::info!("Session cancelled");
                            relay.finish(SessionStatus::Cancelled)
                        }
                        Err(_) => {
                            // Trigger dropped without cancelling
                            cancel_armed = false;
                            Vec::new()
                        }
                    },
                    item = upstream.next() => match item {
                        Some(Ok(event)) => relay.on_upstream(event),
                        Some(Err(e)) => relay.fail(e.to_string()),
                        None => relay.finish(SessionStatus::Completed),
                    },
                };

                for event in events {
                    if tx.send(event).await.is_err() {
                        tracing::debug!("Session receiver dropped");
                        return;
                    }
                }

                if relay.is_finished() {
                    break;
                }
            }
        });

        SessionHandle {
            events: rx,
            cancel: Some(cancel_tx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    fn upstream(items: Vec<crate::Result<UpstreamEvent>>) -> UpstreamStream {
        Box::pin(futures::stream::iter(items))
    }

    fn names(events: &[StreamEvent]) -> Vec<&'static str> {
        events.iter().map(StreamEvent::event_type).collect()
    }

    #[tokio::test]
    async fn test_relays_signals_in_order() {
        let session = StreamSession::default();
        let events: Vec<StreamEvent> = session
            .run(upstream(vec![
                Ok(UpstreamEvent::Checkpoint {
                    checkpoint_id: "cp-1".to_string(),
                }),
                Ok(UpstreamEvent::SearchStart {
                    query: "weather".to_string(),
                }),
                Ok(UpstreamEvent::SearchResults { results: vec![] }),
                Ok(UpstreamEvent::text("# Sun")),
                Ok(UpstreamEvent::text("ny\n")),
            ]))
            .collect()
            .await;

        assert_eq!(
            names(&events),
            vec![
                "checkpoint",
                "search_start",
                "search_results",
                "block_start",
                "content",
                "block_end",
                "end"
            ]
        );
    }

    #[tokio::test]
    async fn test_upstream_error_is_terminal() {
        let session = StreamSession::default();
        let events: Vec<StreamEvent> = session
            .run(upstream(vec![
                Ok(UpstreamEvent::text("- partial")),
                Err(SessionError::Upstream("model unavailable".to_string())),
                Ok(UpstreamEvent::text("never parsed\n")),
            ]))
            .collect()
            .await;

        assert_eq!(
            names(&events),
            vec!["block_start", "content", "block_end", "error", "end"]
        );
        match events.last() {
            Some(StreamEvent::End { status, .. }) => assert_eq!(*status, SessionStatus::Error),
            other => panic!("Expected End event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawned_session_completes() {
        let session = StreamSession::new(SessionConfig::new().with_channel_capacity(2));
        let handle = session.spawn(upstream(vec![
            Ok(UpstreamEvent::text("one\n")),
            Ok(UpstreamEvent::text("two")),
        ]));

        let events = handle.collect().await;
        assert_eq!(names(&events), vec!["content", "content", "end"]);
    }

    #[tokio::test]
    async fn test_zero_capacity_from_config() {
        let config: SessionConfig = serde_json::from_str(r#"{"channel_capacity":0}"#).unwrap();
        assert_eq!(config.channel_capacity, 0);

        let handle =
            StreamSession::new(config).spawn(upstream(vec![Ok(UpstreamEvent::text("hi\n"))]));
        assert_eq!(names(&handle.collect().await), vec!["content", "end"]);
    }

    #[tokio::test]
    async fn test_cancel_flushes_and_closes() {
        let (tx, rx) = mpsc::channel::<crate::Result<UpstreamEvent>>(4);
        let session = StreamSession::default();
        let mut handle = session.spawn(Box::pin(ReceiverStream::new(rx)));

        tx.send(Ok(UpstreamEvent::text("> quoted\nhalf a li"))).await.unwrap();
        assert_eq!(handle.recv().await.map(|e| e.event_type()), Some("block_start"));
        assert_eq!(handle.recv().await.map(|e| e.event_type()), Some("content"));

        handle.cancel();
        let rest = handle.collect().await;
        assert_eq!(names(&rest), vec!["content", "block_end", "end"]);
        match rest.last() {
            Some(StreamEvent::End { status, .. }) => assert_eq!(*status, SessionStatus::Cancelled),
            other => panic!("Expected End event, got {:?}", other),
        }
        drop(tx);
    }
}

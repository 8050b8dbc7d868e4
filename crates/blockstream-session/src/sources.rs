use async_trait::async_trait;
use blockstream_types::SearchResult;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::error::Result;
use crate::upstream::{FragmentSource, TurnRequest, UpstreamEvent, UpstreamStream};

/// Replays a fixed markdown document as small text fragments
///
/// Stands in for a live generator: fragments are cut by character count, so
/// lines and even words are split across fragments.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    document: String,
    chunk_size: usize,
    search: Option<(String, Vec<SearchResult>)>,
}

impl ScriptedSource {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            chunk_size: 16,
            search: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Emit a search round-trip before the text
    pub fn with_search(mut self, query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        self.search = Some((query.into(), results));
        self
    }

    fn fragments(&self) -> Vec<String> {
        let chars: Vec<char> = self.document.chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }
}

#[async_trait]
impl FragmentSource for ScriptedSource {
    async fn open(&self, request: TurnRequest) -> Result<UpstreamStream> {
        let mut events = Vec::new();

        if request.is_new_conversation() {
            events.push(UpstreamEvent::Checkpoint {
                checkpoint_id: Uuid::new_v4().to_string(),
            });
        }

        if let Some((query, results)) = &self.search {
            events.push(UpstreamEvent::SearchStart {
                query: query.clone(),
            });
            events.push(UpstreamEvent::SearchResults {
                results: results.clone(),
            });
        }

        events.extend(self.fragments().into_iter().map(UpstreamEvent::text));

        tracing::debug!(
            events = events.len(),
            resumed = !request.is_new_conversation(),
            "Scripted upstream opened"
        );

        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

/// Replays a recorded upstream transcript, one JSON record per line
#[derive(Debug, Clone)]
pub struct TranscriptSource {
    path: PathBuf,
}

impl TranscriptSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FragmentSource for TranscriptSource {
    async fn open(&self, _request: TurnRequest) -> Result<UpstreamStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();
        tracing::debug!(path = %self.path.display(), "Transcript opened");

        Ok(Box::pin(async_stream::stream! {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        yield UpstreamEvent::from_json(&line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e.into());
                        break;
                    }
                }
            }
        }))
    }
}

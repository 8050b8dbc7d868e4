use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Give every paragraph line its own block id and `block_start`.
    /// When off, paragraph lines flow into the open block like table rows.
    #[serde(default)]
    pub paragraph_blocks: bool,
    /// Emit `content_chunk` previews for fragments that complete no line
    #[serde(default)]
    pub preview_partial_lines: bool,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraph_blocks(mut self, enabled: bool) -> Self {
        self.paragraph_blocks = enabled;
        self
    }

    pub fn with_partial_previews(mut self, enabled: bool) -> Self {
        self.preview_partial_lines = enabled;
        self
    }
}

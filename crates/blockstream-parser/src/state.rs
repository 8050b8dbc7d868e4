use blockstream_types::BlockDescriptor;
use uuid::Uuid;

use crate::line_buffer::LineBuffer;

/// Mutable state of one streaming session
///
/// Owned exclusively by its session and passed by reference into the
/// classifier, annotator and lifecycle manager. `table_headers` is non-empty
/// exactly when `in_table` is set.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    pub line_buffer: LineBuffer,
    pub block_counter: u64,
    pub in_code_block: bool,
    pub code_language: Option<String>,
    pub in_table: bool,
    pub table_headers: Vec<String>,
    pub current_block: Option<BlockDescriptor>,
}

impl ParseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next block id: monotonic counter plus a random suffix
    pub fn next_block_id(&mut self) -> String {
        self.block_counter += 1;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("block_{}_{}", self.block_counter, &suffix[..8])
    }

    pub(crate) fn open_table(&mut self, headers: Vec<String>) {
        self.in_table = true;
        self.table_headers = headers;
    }

    pub(crate) fn close_table(&mut self) {
        if self.in_table {
            tracing::debug!(columns = self.table_headers.len(), "Table closed");
        }
        self.in_table = false;
        self.table_headers.clear();
    }
}

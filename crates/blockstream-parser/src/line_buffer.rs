/// Accumulates text fragments and hands out only newline-terminated lines
///
/// The unterminated tail is kept for the next fragment, so a line is never
/// released before its newline has been seen. Only the `\n` separators are
/// consumed; a `\r` before them stays on the line.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return every line it completed, in order
    pub fn ingest(&mut self, fragment: &str) -> Vec<String> {
        self.pending.push_str(fragment);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        complete[..complete.len() - 1]
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    /// Release the unterminated tail, if any. Called once at end of stream.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

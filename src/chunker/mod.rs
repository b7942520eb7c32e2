//! Splitting long text into chat-sized messages
//!
//! Chunks break on line boundaries where they can. A single line longer than
//! the limit is cut at character boundaries. Line breaks stay attached to the
//! line they end, so concatenating the chunks gives back the input exactly.

use thiserror::Error;

/// Why no chunks were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("nothing to send: message is empty or whitespace")]
    NothingToSend,
    #[error("message limit must be greater than zero")]
    ZeroLimit,
}

/// Split `text` into chunks of at most `limit` characters.
///
/// `context`, when given, counts toward the first chunk's size.
pub fn chunk(text: &str, limit: usize, context: Option<&str>) -> Result<Vec<String>, ChunkError> {
    if limit == 0 {
        return Err(ChunkError::ZeroLimit);
    }
    if text.trim().is_empty() {
        return Err(ChunkError::NothingToSend);
    }

    let mut builder = ChunkBuilder::new(limit);
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        builder.push_segment(context);
    }
    for line in text.split_inclusive('\n') {
        builder.push_segment(line);
    }
    Ok(builder.finish())
}

/// Query context in the form used for the first chunk of a reply
pub fn query_context(query: &str) -> String {
    format!("Query: {}\n\n", query)
}

struct ChunkBuilder {
    limit: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl ChunkBuilder {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn push_segment(&mut self, segment: &str) {
        let len = segment.chars().count();
        if self.current_len + len <= self.limit {
            self.current.push_str(segment);
            self.current_len += len;
            return;
        }

        self.flush();
        if len <= self.limit {
            self.current.push_str(segment);
            self.current_len = len;
            return;
        }

        // oversized line: emit full pieces, keep the tail open for the next line
        let mut piece = String::new();
        let mut piece_len = 0;
        for ch in segment.chars() {
            piece.push(ch);
            piece_len += 1;
            if piece_len == self.limit {
                self.chunks.push(std::mem::take(&mut piece));
                piece_len = 0;
            }
        }
        self.current = piece;
        self.current_len = piece_len;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

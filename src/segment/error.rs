//! Errors raised while segmenting outbound messages.

use thiserror::Error;

/// Reasons a message cannot be represented as frames.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    /// The text contains a NUL byte, which the receiver strips as padding.
    #[error("message contains a NUL byte at offset {offset}")]
    InteriorNul { offset: usize },
    /// A single character is wider than the configured chunk size.
    #[error("character at offset {offset} needs {width} bytes but chunks hold {chunk_size}")]
    ChunkTooSmall {
        offset: usize,
        width: usize,
        chunk_size: usize,
    },
}

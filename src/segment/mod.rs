//! Outbound segmentation of text messages into bounded frames.
//!
//! Small messages travel as a single bare frame. Anything larger is sent as a
//! `"Size: N"` header frame followed by `N` data frames.

pub mod error;
pub mod header;
pub mod segmenter;

pub use error::SegmentError;
pub use header::{HEADER_PREFIX, SizeHeader};
pub use segmenter::{SegmentBatch, Segmenter, segment};

#[cfg(test)]
mod tests;

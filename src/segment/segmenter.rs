//! Outbound helper that splits text messages into bounded frames.
//!
//! [`Segmenter`] cuts a message into data frames of at most `chunk_size`
//! bytes, never splitting a UTF-8 code point, and prepends a [`SizeHeader`]
//! frame announcing how many data frames follow. Messages that already fit
//! into a single frame bypass the header entirely.

use std::num::NonZeroUsize;

use super::{HEADER_PREFIX, SegmentError, SizeHeader};
use crate::frame::{Frame, PADDING};

/// Split `message` into frames of at most `chunk_size` bytes.
///
/// Shorthand for [`Segmenter::new`] followed by [`Segmenter::segment`].
///
/// # Errors
///
/// See [`Segmenter::segment`].
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use gattwire::{Frame, segment::segment};
///
/// let chunk = NonZeroUsize::new(5).expect("non-zero");
/// let batch = segment("hello world", chunk).expect("segment");
/// let frames: Vec<Frame> = batch.into_frames();
/// assert_eq!(
///     frames,
///     vec![
///         Frame::from("Size: 3"),
///         Frame::from("hello"),
///         Frame::from(" worl"),
///         Frame::from("d"),
///     ]
/// );
/// ```
pub fn segment(message: &str, chunk_size: NonZeroUsize) -> Result<SegmentBatch, SegmentError> {
    Segmenter::new(chunk_size).segment(message)
}

/// Splits text messages into frame-sized chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segmenter {
    chunk_size: NonZeroUsize,
    pad_frames: bool,
}

impl Segmenter {
    /// Create a segmenter emitting data frames of at most `chunk_size` bytes.
    #[must_use]
    pub const fn new(chunk_size: NonZeroUsize) -> Self {
        Self {
            chunk_size,
            pad_frames: false,
        }
    }

    /// Pad every frame shorter than the chunk size with NUL bytes.
    ///
    /// Needed when the transport only accepts fixed-length frames.
    #[must_use]
    pub const fn with_padding(mut self, pad_frames: bool) -> Self {
        self.pad_frames = pad_frames;
        self
    }

    /// Maximum number of payload bytes per data frame.
    #[must_use]
    pub const fn chunk_size(&self) -> NonZeroUsize { self.chunk_size }

    /// Whether short frames are padded to the chunk size.
    #[must_use]
    pub const fn pads_frames(&self) -> bool { self.pad_frames }

    /// Split `message` into frames.
    ///
    /// A message that fits one frame is sent bare. Empty messages and short
    /// messages whose text would itself parse as a header are always framed,
    /// so the receiver never confuses payload with protocol.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InteriorNul`] if the message contains a NUL
    /// byte and [`SegmentError::ChunkTooSmall`] if a single character does
    /// not fit into one chunk.
    pub fn segment(&self, message: &str) -> Result<SegmentBatch, SegmentError> {
        if let Some(offset) = message.bytes().position(|b| b == PADDING) {
            return Err(SegmentError::InteriorNul { offset });
        }

        let needs_header = message.is_empty()
            || message.len() > self.chunk_size.get()
            || SizeHeader::parse_str(message).is_some();
        if !needs_header {
            return Ok(SegmentBatch::bare(self.finish(message.as_bytes())));
        }

        let chunks = Self::unambiguous(self.split(message)?);
        let header = SizeHeader::new(chunks.len());
        let mut frames = Vec::with_capacity(chunks.len() + 1);
        frames.push(self.finish(header.to_string().as_bytes()));
        frames.extend(chunks.into_iter().map(|chunk| self.finish(chunk.as_bytes())));
        Ok(SegmentBatch::framed(header, frames))
    }

    fn split<'a>(&self, message: &'a str) -> Result<Vec<&'a str>, SegmentError> {
        let max = self.chunk_size.get();
        let mut chunks = Vec::with_capacity(message.len().div_ceil(max));
        let mut start = 0usize;

        for (offset, ch) in message.char_indices() {
            let width = ch.len_utf8();
            if width > max {
                return Err(SegmentError::ChunkTooSmall {
                    offset,
                    width,
                    chunk_size: max,
                });
            }
            if offset + width - start > max {
                chunks.push(&message[start..offset]);
                start = offset;
            }
        }
        if start < message.len() {
            chunks.push(&message[start..]);
        }
        Ok(chunks)
    }

    // A data chunk reading as a header would restart the receiver.
    fn unambiguous(chunks: Vec<&str>) -> Vec<&str> {
        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if SizeHeader::parse_str(chunk).is_some() {
                let (prefix, digits) = chunk.split_at(HEADER_PREFIX.len());
                out.extend([prefix, digits]);
            } else {
                out.push(chunk);
            }
        }
        out
    }

    fn finish(&self, bytes: &[u8]) -> Frame {
        let width = self.chunk_size.get();
        if !self.pad_frames || bytes.len() >= width {
            return Frame::from(bytes.to_vec());
        }
        let mut padded = Vec::with_capacity(width);
        padded.extend_from_slice(bytes);
        padded.resize(width, PADDING);
        Frame::from(padded)
    }
}

/// Frames produced for a single outbound message, header first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentBatch {
    header: Option<SizeHeader>,
    frames: Vec<Frame>,
}

impl SegmentBatch {
    fn bare(frame: Frame) -> Self {
        Self {
            header: None,
            frames: vec![frame],
        }
    }

    fn framed(header: SizeHeader, frames: Vec<Frame>) -> Self {
        debug_assert_eq!(frames.len(), header.count() + 1, "header must match data frames");
        Self {
            header: Some(header),
            frames,
        }
    }

    /// Header announcing the data frames, if the message was framed.
    #[must_use]
    pub const fn header(&self) -> Option<SizeHeader> { self.header }

    /// Whether the message needed a header frame.
    #[must_use]
    pub const fn is_framed(&self) -> bool { self.header.is_some() }

    /// All frames in send order, header included.
    #[must_use]
    pub fn frames(&self) -> &[Frame] { self.frames.as_slice() }

    /// Data frames only.
    #[must_use]
    pub fn data_frames(&self) -> &[Frame] {
        let skip = usize::from(self.is_framed());
        &self.frames[skip..]
    }

    /// Number of frames in the batch, header included.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches always hold at least one frame"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.frames.len() }

    /// Consume the batch, returning all frames in send order.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> { self.frames }
}

impl IntoIterator for SegmentBatch {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter { self.frames.into_iter() }
}

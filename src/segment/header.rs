//! The `"Size: N"` header frame that precedes segmented messages.

use std::fmt;

use crate::frame::Frame;

/// Textual prefix shared by every header frame.
pub const HEADER_PREFIX: &str = "Size: ";

/// Header announcing how many data frames follow.
///
/// On the wire the header is the UTF-8 text `"Size: <N>"` where `N` is the
/// decimal count of data frames, not counting the header itself.
///
/// # Examples
///
/// ```
/// use gattwire::{Frame, segment::SizeHeader};
/// let header = SizeHeader::new(3);
/// assert_eq!(header.to_frame(), Frame::from("Size: 3"));
/// assert_eq!(SizeHeader::parse(&Frame::from("Size: 3")), Some(header));
/// assert_eq!(SizeHeader::parse(&Frame::from("Size: three")), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SizeHeader {
    count: usize,
}

impl SizeHeader {
    /// Create a header announcing `count` data frames.
    #[must_use]
    pub const fn new(count: usize) -> Self { Self { count } }

    /// Number of data frames announced by the header.
    #[must_use]
    pub const fn count(&self) -> usize { self.count }

    /// Whether the header announces an empty message.
    #[must_use]
    pub const fn is_empty_message(&self) -> bool { self.count == 0 }

    /// Encode the header as a frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame { Frame::from(self.to_string()) }

    /// Parse a frame as a header, ignoring trailing padding.
    ///
    /// Returns `None` when the frame is not exactly `"Size: "` followed by
    /// one or more ASCII digits that fit in `usize`.
    #[must_use]
    pub fn parse(frame: &Frame) -> Option<Self> { Self::parse_str(frame.text()?) }

    /// Parse header text.
    #[must_use]
    pub fn parse_str(text: &str) -> Option<Self> {
        let digits = text.strip_prefix(HEADER_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self::new)
    }
}

impl fmt::Display for SizeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HEADER_PREFIX}{}", self.count)
    }
}

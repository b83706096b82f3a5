//! Frames exchanged with the transport.
//!
//! A [`Frame`] is one bounded, opaque unit written to or received from a
//! channel. Frames carry no sequence number; their order on a channel is the
//! order in which the transport delivers them.

use std::fmt;

use bytes::Bytes;

/// Padding byte appended to short frames on fixed-width transports.
pub const PADDING: u8 = 0;

/// One unit of data exchanged over the transport.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Frame(Bytes);

impl Frame {
    /// Wrap raw bytes as a frame.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self { Self(bytes.into()) }

    /// Borrow the frame payload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Number of payload bytes, padding included.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the frame carries no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Payload with trailing padding removed.
    #[must_use]
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|byte| *byte != PADDING)
            .map_or(0, |last| last + 1);
        &self.0[..end]
    }

    /// Decode the frame as UTF-8 text, ignoring trailing padding.
    #[must_use]
    pub fn text(&self) -> Option<&str> { std::str::from_utf8(self.trimmed()).ok() }

    /// Consume the frame, returning the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.0 }
}

impl From<Bytes> for Frame {
    fn from(value: Bytes) -> Self { Self(value) }
}

impl From<Vec<u8>> for Frame {
    fn from(value: Vec<u8>) -> Self { Self(Bytes::from(value)) }
}

impl From<&'static str> for Frame {
    fn from(value: &'static str) -> Self { Self(Bytes::from_static(value.as_bytes())) }
}

impl From<String> for Frame {
    fn from(value: String) -> Self { Self(Bytes::from(value)) }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => write!(f, "Frame({text:?})"),
            Err(_) => write!(f, "Frame({:02x?})", self.0.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn trimmed_strips_only_trailing_padding() {
        let frame = Frame::from(b"a\0b\0\0".to_vec());
        assert_eq!(frame.trimmed(), b"a\0b");
        assert_eq!(frame.len(), 5);
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        assert_eq!(Frame::from("hello").text(), Some("hello"));
        assert!(Frame::from(vec![0xff, 0xfe]).text().is_none());
    }

    #[test]
    fn all_padding_frame_trims_to_empty() {
        assert!(Frame::from(vec![0, 0, 0]).trimmed().is_empty());
    }
}

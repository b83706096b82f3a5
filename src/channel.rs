//! Channel identifiers used to route frames.
//!
//! A [`ChannelId`] plays the role of a characteristic UUID on the radio link:
//! every frame is written to, and arrives on, exactly one channel. Each
//! channel owns its own reassembly state inside a [`Link`](crate::Link).

use std::{borrow::Cow, fmt};

/// Identifier of a characteristic-like channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(Cow<'static, str>);

impl ChannelId {
    /// Default data channel shared by both peers.
    pub const DATA: ChannelId = ChannelId(Cow::Borrowed("0x3232"));

    /// Create a channel identifier from a static string without allocating.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self { Self(Cow::Borrowed(id)) }

    /// Create a channel identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self { Self(Cow::Owned(id.into())) }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&'static str> for ChannelId {
    fn from(value: &'static str) -> Self { Self::from_static(value) }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self { Self(Cow::Owned(value)) }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::ChannelId;

    #[test]
    fn owned_and_static_ids_compare_equal() {
        assert_eq!(ChannelId::new("0x3232"), ChannelId::DATA);
        assert_eq!(ChannelId::from("0xFFE1").to_string(), "0xFFE1");
    }
}

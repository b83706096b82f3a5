#![doc(html_root_url = "https://docs.rs/gattwire/latest")]
//! Public API for the `gattwire` library.
//!
//! This crate carries text messages over a transport that only moves small,
//! discrete frames addressed to a channel, such as characteristic writes on
//! a radio link. Outbound messages are segmented into a `"Size: N"` header
//! and `N` bounded data frames, written strictly one at a time through an
//! ordered queue, and reassembled per channel on the receiving side.

pub mod channel;
pub mod frame;
pub mod link;
pub mod metrics;
pub mod queue;
pub mod reassembly;
pub mod segment;
pub mod transport;

pub use channel::ChannelId;
pub use frame::Frame;
pub use link::{
    ConfigError,
    InboundMessage,
    Inbox,
    Link,
    LinkConfig,
    LinkConfigBuilder,
    LinkError,
    LinkEvent,
    SendError,
    SendReceipt,
};
pub use metrics::{Direction, FRAMES_PROCESSED};
pub use queue::{OrderedQueue, QueueError};
pub use reassembly::{HeaderCollision, IdleFramePolicy, Reassembler, ReassemblyError};
pub use segment::{SegmentBatch, SegmentError, Segmenter, SizeHeader, segment};
pub use transport::{Transport, TransportError};

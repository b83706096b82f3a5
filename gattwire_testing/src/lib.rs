//! Utilities for exercising `gattwire` links in tests.
//!
//! [`RecordingTransport`] captures outbound frames and can inject write
//! failures, [`LinkedPair`] wires two links together in memory, and the
//! [`logger`] fixture serialises access to captured `log` records.
//!
//! ```rust
//! use gattwire::{ChannelId, LinkConfig};
//! use gattwire_testing::LinkedPair;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut pair = LinkedPair::new(&LinkConfig::default()).expect("pair");
//! pair.a.link.send(&ChannelId::DATA, "ping").expect("send");
//! let message = pair.b.inbox.recv_message().await.expect("message");
//! assert_eq!(message.text, "ping");
//! # }
//! ```

pub mod logging;
pub mod metrics;
pub mod pair;
pub mod transport;

pub use logging::{LoggerHandle, logger};
pub use metrics::{counter_total, debugging_recorder};
pub use pair::{LinkEnd, LinkedPair};
pub use transport::RecordingTransport;

/// Result type for tests that use `?`.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

//! Failures reported by the inbound reassembly layer.

use std::{num::NonZeroUsize, time::Duration};

use thiserror::Error;

/// Reasons a started reassembly ended without a message.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// All announced frames arrived but the joined payload is not UTF-8.
    #[error("reassembled payload of {frames} frames is not valid UTF-8")]
    Undecodable { frames: usize },
    /// The message did not complete within the configured timeout.
    #[error("reassembly timed out after {elapsed:?} with {received} of {expected} frames")]
    Timeout {
        expected: usize,
        received: usize,
        elapsed: Duration,
    },
    /// Accumulated frames exceeded the configured message size cap.
    #[error("reassembled message would reach {attempted} bytes, limit is {limit}")]
    MessageTooLarge {
        attempted: usize,
        limit: NonZeroUsize,
    },
}

//! Inbound reassembly of frames into text messages.
//!
//! One [`Reassembler`] exists per channel. It turns the `"Size: N"` header and
//! the `N` data frames that follow back into the original message.

pub mod error;
pub mod reassembler;

pub use error::ReassemblyError;
pub use reassembler::{HeaderCollision, IdleFramePolicy, Reassembler};

#[cfg(test)]
mod tests;

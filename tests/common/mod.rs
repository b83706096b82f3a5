//! Shared fixtures for integration tests.

#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use gattwire::LinkConfig;
use rstest::fixture;

/// Chunk size small enough that short test strings need several frames.
pub const SMALL_CHUNK: usize = 5;

/// Default configuration apart from a tiny chunk size.
#[fixture]
pub fn small_chunks() -> LinkConfig {
    LinkConfig::builder()
        .chunk_size(SMALL_CHUNK)
        .build()
        .expect("valid config")
}

/// Tiny chunks padded to a fixed width.
#[fixture]
pub fn padded_chunks() -> LinkConfig {
    LinkConfig::builder()
        .chunk_size(SMALL_CHUNK)
        .pad_frames(true)
        .build()
        .expect("valid config")
}

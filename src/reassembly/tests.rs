//! Tests for the per-channel reassembly state machine.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};
use tracing_test::traced_test;

use crate::{
    frame::Frame,
    reassembly::{HeaderCollision, IdleFramePolicy, Reassembler, ReassemblyError},
    segment::segment,
};

#[fixture]
fn strict() -> Reassembler { Reassembler::new().with_idle_policy(IdleFramePolicy::Drop) }

fn feed(reassembler: &mut Reassembler, frames: &[&'static str]) -> Vec<String> {
    frames
        .iter()
        .filter_map(|text| {
            reassembler
                .push(Frame::from(*text))
                .expect("frame accepted")
        })
        .collect()
}

#[test]
fn hello_world_reassembles_once() {
    let mut reassembler = Reassembler::new();
    let messages = feed(&mut reassembler, &["Size: 3", "hello", " worl", "d"]);

    assert_eq!(messages, vec!["hello world".to_owned()]);
    assert!(!reassembler.is_collecting());
}

#[rstest]
#[case::prose("The quick brown fox jumps over the lazy dog, twice: ünïcödé.", 7)]
#[case::header_look_alike("Size: 7", 64)]
#[case::embedded_header("abcdefgSize: 1", 7)]
fn segmented_frames_round_trip(#[case] message: &str, #[case] chunk: usize) {
    let batch = segment(message, NonZeroUsize::new(chunk).expect("non-zero")).expect("segment");
    let mut reassembler = Reassembler::new();

    let mut completed = Vec::new();
    for frame in batch {
        if let Some(text) = reassembler.push(frame).expect("frame accepted") {
            completed.push(text);
        }
    }
    assert_eq!(completed, vec![message.to_owned()]);
}

#[test]
fn bare_frame_while_idle_is_delivered_by_default() {
    let mut reassembler = Reassembler::new();
    let messages = feed(&mut reassembler, &["short"]);
    assert_eq!(messages, vec!["short".to_owned()]);
}

#[rstest]
fn bare_frame_while_idle_is_dropped_when_strict(mut strict: Reassembler) {
    assert!(feed(&mut strict, &["short"]).is_empty());
    assert!(!strict.is_collecting());
}

#[rstest]
fn stray_frame_before_header_is_not_counted(mut strict: Reassembler) {
    let messages = feed(&mut strict, &["stray", "Size: 2", "ab", "cd"]);
    assert_eq!(messages, vec!["abcd".to_owned()]);
}

#[test]
fn stray_frame_is_its_own_message_when_delivering() {
    let mut reassembler = Reassembler::new();
    let messages = feed(&mut reassembler, &["stray", "Size: 2", "ab", "cd"]);
    assert_eq!(messages, vec!["stray".to_owned(), "abcd".to_owned()]);
}

#[test]
fn zero_header_completes_an_empty_message() {
    let mut reassembler = Reassembler::new();
    let messages = feed(&mut reassembler, &["Size: 0"]);
    assert_eq!(messages, vec![String::new()]);
    assert!(!reassembler.is_collecting());
}

#[test]
fn header_state_is_visible_while_collecting() {
    let mut reassembler = Reassembler::new();
    feed(&mut reassembler, &["Size: 3", "a"]);

    assert!(reassembler.is_collecting());
    assert_eq!(reassembler.expected(), 3);
    assert_eq!(reassembler.received(), 1);
}

#[test]
fn undecodable_frames_are_skipped_without_counting() {
    let mut reassembler = Reassembler::new();
    assert!(reassembler.push(Frame::from("Size: 2")).expect("header").is_none());
    assert!(
        reassembler
            .push(Frame::from(vec![0xff, 0xfe]))
            .expect("dropped")
            .is_none()
    );
    assert_eq!(reassembler.received(), 0);

    let messages = feed(&mut reassembler, &["ok", "!"]);
    assert_eq!(messages, vec!["ok!".to_owned()]);
}

#[test]
fn padding_is_stripped_from_every_frame() {
    let mut reassembler = Reassembler::new();
    reassembler
        .push(Frame::from(b"Size: 2\0".to_vec()))
        .expect("header");
    reassembler
        .push(Frame::from(b"abcd".to_vec()))
        .expect("data");
    let message = reassembler
        .push(Frame::from(b"ef\0\0".to_vec()))
        .expect("data")
        .expect("complete");
    assert_eq!(message, "abcdef");
}

#[test]
#[traced_test]
fn new_header_restarts_collection_by_default() {
    let mut reassembler = Reassembler::new();
    let messages = feed(&mut reassembler, &["Size: 3", "lost", "Size: 1", "kept"]);
    assert_eq!(messages, vec!["kept".to_owned()]);
    assert!(logs_contain("discarding partial message"));
}

#[test]
fn new_header_is_ignored_when_configured() {
    let mut reassembler = Reassembler::new().with_header_collision(HeaderCollision::Ignore);
    let messages = feed(&mut reassembler, &["Size: 2", "fi", "Size: 9", "rst"]);
    assert_eq!(messages, vec!["first".to_owned()]);
}

#[test]
fn interior_padding_is_removed_from_the_joined_payload() {
    let mut reassembler = Reassembler::new();
    reassembler.push(Frame::from("Size: 2")).expect("header");
    reassembler
        .push(Frame::from(b"h\0\xc3\xa9".to_vec()))
        .expect("data");
    let message = reassembler
        .push(Frame::from(b"llo\0\0".to_vec()))
        .expect("data")
        .expect("complete");
    assert_eq!(message, "h\u{e9}llo");
}

#[test]
fn stale_partial_message_is_purged_after_timeout() {
    let start = Instant::now();
    let mut reassembler = Reassembler::new().with_timeout(Some(Duration::from_secs(5)));
    reassembler
        .push_at(Frame::from("Size: 2"), start)
        .expect("header");
    reassembler.push_at(Frame::from("a"), start).expect("data");

    assert!(
        reassembler
            .purge_expired_at(start + Duration::from_secs(4))
            .is_none()
    );
    let err = reassembler
        .purge_expired_at(start + Duration::from_secs(5))
        .expect("expired");
    assert_eq!(
        err,
        ReassemblyError::Timeout {
            expected: 2,
            received: 1,
            elapsed: Duration::from_secs(5),
        }
    );
    assert!(!reassembler.is_collecting());
}

#[test]
fn purge_without_timeout_never_expires() {
    let start = Instant::now();
    let mut reassembler = Reassembler::new();
    reassembler
        .push_at(Frame::from("Size: 2"), start)
        .expect("header");
    assert!(
        reassembler
            .purge_expired_at(start + Duration::from_secs(3600))
            .is_none()
    );
    assert!(reassembler.is_collecting());
}

#[test]
fn oversized_message_is_discarded() {
    let limit = NonZeroUsize::new(4).expect("non-zero");
    let mut reassembler = Reassembler::new().with_max_message_size(Some(limit));
    reassembler.push(Frame::from("Size: 3")).expect("header");
    reassembler.push(Frame::from("abc")).expect("within limit");

    let err = reassembler
        .push(Frame::from("de"))
        .expect_err("exceeds limit");
    assert_eq!(
        err,
        ReassemblyError::MessageTooLarge {
            attempted: 5,
            limit,
        }
    );
    assert!(!reassembler.is_collecting());
}

#[test]
fn huge_header_count_does_not_stall_the_channel() {
    let mut reassembler = Reassembler::new();
    let huge = format!("Size: {}", usize::MAX);

    assert_eq!(reassembler.push(Frame::from(huge)).expect("header"), None);
    assert_eq!(reassembler.expected(), usize::MAX);

    let messages = feed(&mut reassembler, &["Size: 1", "ok"]);
    assert_eq!(messages, vec!["ok".to_owned()]);
}

#[test]
fn header_count_beyond_size_cap_is_dropped() {
    let limit = NonZeroUsize::new(16).expect("non-zero");
    let mut reassembler = Reassembler::new().with_max_message_size(Some(limit));

    feed(&mut reassembler, &["Size: 2", "ab"]);
    assert_eq!(
        reassembler.push(Frame::from("Size: 100000000000")).expect("header"),
        None
    );
    assert_eq!((reassembler.expected(), reassembler.received()), (2, 1));

    let messages = feed(&mut reassembler, &["cd"]);
    assert_eq!(messages, vec!["abcd".to_owned()]);
}

#[test]
fn reset_returns_to_idle() {
    let mut reassembler = Reassembler::new();
    feed(&mut reassembler, &["Size: 4", "a"]);
    reassembler.reset();
    assert!(!reassembler.is_collecting());
    assert_eq!(reassembler.expected(), 0);
}

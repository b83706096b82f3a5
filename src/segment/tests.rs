//! Tests for outbound segmentation and header encoding.

use std::num::NonZeroUsize;

use rstest::rstest;

use crate::{
    frame::Frame,
    segment::{SegmentError, Segmenter, SizeHeader, segment},
};

fn chunk(size: usize) -> NonZeroUsize { NonZeroUsize::new(size).expect("non-zero") }

#[test]
fn splits_hello_world_into_header_and_three_chunks() {
    let batch = segment("hello world", chunk(5)).expect("segment");

    assert_eq!(batch.header(), Some(SizeHeader::new(3)));
    assert_eq!(
        batch.frames(),
        &[
            Frame::from("Size: 3"),
            Frame::from("hello"),
            Frame::from(" worl"),
            Frame::from("d"),
        ]
    );
    assert_eq!(batch.data_frames().len(), 3);
}

#[rstest]
#[case::shorter_than_chunk(50)]
#[case::exactly_chunk(128)]
fn small_messages_bypass_the_header(#[case] length: usize) {
    let message = "h".repeat(length);
    let batch = segment(&message, chunk(128)).expect("segment");

    assert!(!batch.is_framed());
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.frames()[0].as_bytes(), message.as_bytes());
}

#[test]
fn message_one_byte_over_chunk_is_framed() {
    let message = "h".repeat(129);
    let batch = segment(&message, chunk(128)).expect("segment");

    assert_eq!(batch.header(), Some(SizeHeader::new(2)));
    assert_eq!(batch.data_frames()[0].len(), 128);
    assert_eq!(batch.data_frames()[1].len(), 1);
}

#[test]
fn empty_message_is_a_bare_zero_header() {
    let batch = segment("", chunk(16)).expect("segment");

    assert_eq!(batch.frames(), &[Frame::from("Size: 0")]);
    assert!(batch.data_frames().is_empty());
}

#[test]
fn header_lookalike_is_framed_to_stay_unambiguous() {
    let batch = segment("Size: 7", chunk(64)).expect("segment");

    assert_eq!(
        batch.frames(),
        &[
            Frame::from("Size: 2"),
            Frame::from("Size: "),
            Frame::from("7")
        ]
    );
}

#[test]
fn data_chunks_never_parse_as_headers() {
    let batch = segment("abcdefgSize: 1", chunk(7)).expect("segment");

    assert_eq!(batch.header(), Some(SizeHeader::new(3)));
    assert!(
        batch
            .data_frames()
            .iter()
            .all(|frame| SizeHeader::parse(frame).is_none())
    );
    assert_eq!(
        batch.data_frames(),
        &[
            Frame::from("abcdefg"),
            Frame::from("Size: "),
            Frame::from("1")
        ]
    );
}

#[test]
fn multibyte_characters_are_never_split() {
    // Each 'é' is two bytes; a chunk of three bytes fits one of them.
    let batch = segment("ééé", chunk(3)).expect("segment");

    assert_eq!(batch.header(), Some(SizeHeader::new(3)));
    for frame in batch.data_frames() {
        assert_eq!(frame.text(), Some("é"));
    }
}

#[test]
fn character_wider_than_chunk_is_rejected() {
    let err = segment("a🦀b", chunk(2)).expect_err("crab does not fit");
    assert_eq!(
        err,
        SegmentError::ChunkTooSmall {
            offset: 1,
            width: 4,
            chunk_size: 2,
        }
    );
}

#[test]
fn nul_bytes_are_rejected() {
    let err = segment("ab\0c", chunk(2)).expect_err("NUL would be stripped");
    assert_eq!(err, SegmentError::InteriorNul { offset: 2 });
}

#[test]
fn padding_fills_short_frames_to_chunk_width() {
    let segmenter = Segmenter::new(chunk(8)).with_padding(true);
    let batch = segmenter.segment("abcdefghij").expect("segment");

    let frames = batch.frames();
    assert_eq!(frames[0].as_bytes(), b"Size: 2\0");
    assert_eq!(frames[1].as_bytes(), b"abcdefgh");
    assert_eq!(frames[2].as_bytes(), b"ij\0\0\0\0\0\0");
    assert!(frames.iter().all(|frame| frame.len() == 8));
}

#[test]
fn header_may_exceed_a_tiny_chunk() {
    let batch = segment("abc", chunk(1)).expect("segment");
    assert_eq!(batch.frames()[0], Frame::from("Size: 3"));
    assert_eq!(batch.len(), 4);
}

#[rstest]
#[case("Size: 0", Some(0))]
#[case("Size: 12", Some(12))]
#[case("Size: ", None)]
#[case("Size: +3", None)]
#[case("Size:3", None)]
#[case("size: 3", None)]
#[case("Size: 3 ", None)]
fn header_parsing_is_strict(#[case] text: &str, #[case] expected: Option<usize>) {
    assert_eq!(SizeHeader::parse_str(text).map(|h| h.count()), expected);
}

#[test]
fn padded_header_parses() {
    let frame = Frame::from(b"Size: 4\0\0\0".to_vec());
    assert_eq!(SizeHeader::parse(&frame), Some(SizeHeader::new(4)));
}

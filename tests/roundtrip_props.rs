//! Property tests: anything the segmenter emits, a fresh reassembler restores.

use std::num::NonZeroUsize;

use gattwire::{Reassembler, Segmenter, SizeHeader};
use proptest::prelude::*;

fn reassemble(frames: Vec<gattwire::Frame>) -> Vec<String> {
    let mut reassembler = Reassembler::new();
    frames
        .into_iter()
        .filter_map(|frame| reassembler.push(frame).expect("reassembly"))
        .collect()
}

proptest! {
    #[test]
    fn text_survives_segmentation(
        text in "[^\u{0}]{0,300}",
        chunk_size in 4usize..64,
        pad_frames in any::<bool>(),
    ) {
        let chunk = NonZeroUsize::new(chunk_size).expect("non-zero chunk");
        let batch = Segmenter::new(chunk)
            .with_padding(pad_frames)
            .segment(&text)
            .expect("segmentable text");

        for frame in batch.data_frames() {
            prop_assert!(frame.len() <= chunk_size);
        }
        if let Some(header) = batch.header() {
            prop_assert_eq!(header.count(), batch.data_frames().len());
            prop_assert_eq!(SizeHeader::parse(&batch.frames()[0]), Some(header));
        }
        prop_assert_eq!(reassemble(batch.into_frames()), vec![text]);
    }

    #[test]
    fn consecutive_messages_stay_separate(
        first in "[a-z ]{0,40}",
        second in "[a-z ]{0,40}",
        chunk_size in 4usize..16,
    ) {
        let segmenter = Segmenter::new(NonZeroUsize::new(chunk_size).expect("non-zero chunk"));
        let mut frames = segmenter.segment(&first).expect("segment").into_frames();
        frames.extend(segmenter.segment(&second).expect("segment"));

        prop_assert_eq!(reassemble(frames), vec![first, second]);
    }
}

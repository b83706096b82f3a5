#![cfg(feature = "metrics")]
//! Counters recorded while frames move through a link.
//!
//! Uses a local `DebuggingRecorder` and a current-thread runtime so every
//! spawned task records into the same recorder.

use gattwire::{
    ChannelId,
    Frame,
    Link,
    LinkConfig,
    metrics::{
        Direction,
        FRAMES_DROPPED,
        FRAMES_PROCESSED,
        MESSAGES_REASSEMBLED,
        REASSEMBLY_TIMEOUTS,
        SEND_FAILURES,
    },
};
use gattwire_testing::{RecordingTransport, counter_total, debugging_recorder};
use rstest::rstest;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

#[rstest]
#[case::inbound(Direction::Inbound)]
#[case::outbound(Direction::Outbound)]
fn frame_helper_labels_direction(#[case] direction: Direction) {
    let (snapshotter, recorder) = debugging_recorder();
    metrics::with_local_recorder(&recorder, || gattwire::metrics::inc_frames(direction));

    assert_eq!(
        counter_total(
            &snapshotter,
            FRAMES_PROCESSED,
            Some(("direction", direction.as_str()))
        ),
        1
    );
}

#[test]
fn outbound_frames_and_failures_are_counted() {
    let (snapshotter, recorder) = debugging_recorder();
    metrics::with_local_recorder(&recorder, || {
        block_on(async {
            let transport = RecordingTransport::new();
            transport.fail_attempt(0);
            let config = LinkConfig::builder().chunk_size(5).build().expect("config");
            let (link, _inbox) = Link::new(transport, config).expect("link");
            let receipt = link.send(&ChannelId::DATA, "hello world").expect("send");
            assert!(receipt.wait().await.is_err());
        });
    });

    assert_eq!(
        counter_total(&snapshotter, FRAMES_PROCESSED, Some(("direction", "outbound"))),
        3
    );
    assert_eq!(counter_total(&snapshotter, SEND_FAILURES, None), 1);
}

#[test]
fn inbound_messages_and_drops_are_counted() {
    let (snapshotter, recorder) = debugging_recorder();
    metrics::with_local_recorder(&recorder, || {
        block_on(async {
            let config = LinkConfig::builder()
                .idle_policy(gattwire::IdleFramePolicy::Drop)
                .build()
                .expect("config");
            let (link, _inbox) = Link::new(RecordingTransport::new(), config).expect("link");
            for text in ["stray", "Size: 1", "hello"] {
                link.deliver_frame(&ChannelId::DATA, Frame::from(text))
                    .await
                    .expect("deliver");
            }
        });
    });

    assert_eq!(
        counter_total(&snapshotter, FRAMES_PROCESSED, Some(("direction", "inbound"))),
        3
    );
    assert_eq!(counter_total(&snapshotter, MESSAGES_REASSEMBLED, None), 1);
    assert_eq!(
        counter_total(&snapshotter, FRAMES_DROPPED, Some(("reason", "no_header"))),
        1
    );
}

#[test]
fn purged_reassemblies_are_counted() {
    let (snapshotter, recorder) = debugging_recorder();
    metrics::with_local_recorder(&recorder, || {
        let mut reassembler =
            gattwire::Reassembler::new().with_timeout(Some(std::time::Duration::ZERO));
        reassembler.push(Frame::from("Size: 2")).expect("header");
        assert!(reassembler.purge_expired().is_some());
    });

    assert_eq!(counter_total(&snapshotter, REASSEMBLY_TIMEOUTS, None), 1);
}

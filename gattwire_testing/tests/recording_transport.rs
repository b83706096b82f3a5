//! Tests for the recording transport's failure injection and bookkeeping.

use gattwire::{ChannelId, Frame, Transport};
use gattwire_testing::RecordingTransport;

#[tokio::test]
async fn successful_writes_are_recorded_in_order() {
    let transport = RecordingTransport::new();
    for text in ["one", "two"] {
        transport
            .send_frame(&ChannelId::DATA, Frame::from(text))
            .await
            .expect("write");
    }

    assert_eq!(transport.texts(), vec!["one", "two"]);
    assert_eq!(transport.attempts(), 2);
    assert_eq!(transport.peak_in_flight(), 1);
}

#[tokio::test]
async fn injected_failures_are_not_recorded() {
    let transport = RecordingTransport::new();
    let broken = ChannelId::from_static("0xFFE1");
    transport.fail_attempt(1);
    transport.fail_channel(broken.clone());

    let results = [
        transport.send_frame(&ChannelId::DATA, Frame::from("a")).await,
        transport.send_frame(&ChannelId::DATA, Frame::from("b")).await,
        transport.send_frame(&broken, Frame::from("c")).await,
    ];

    assert!(results[0].is_ok());
    assert_eq!(
        results[1].as_ref().map_err(|err| err.reason().to_owned()),
        Err("injected failure on attempt 1".to_owned())
    );
    assert!(results[2].is_err());
    assert_eq!(transport.texts(), vec!["a"]);

    transport.heal();
    transport
        .send_frame(&broken, Frame::from("d"))
        .await
        .expect("healed");
    assert_eq!(transport.texts(), vec!["a", "d"]);
}

use std::time::Duration;

use slimlink::protocol::{codec, ClientMessage, ManualClock, StatusCode, StatusTracker};

#[test]
fn test_status_message_carries_clock_uptime_onto_the_wire() {
    let clock = ManualClock::new();
    let handle = clock.clone();
    let mut tracker = StatusTracker::with_clock(Box::new(clock));

    handle.advance(Duration::from_millis(0x0102_0304));
    tracker.set_buffer_size(128 * 1024);
    tracker.add_bytes_received(4096);

    let message = tracker.create_status_message(StatusCode::Timer);
    let frame = codec::encode(&message);

    assert_eq!(&frame[..4], b"STAT");
    assert_eq!(&frame[8..12], b"STMt");
    // jiffies: after crlf(1) + reserved(2) + buffer_size(4) + fullness(4)
    // + bytes_received(8) + signal_strength(2) = offset 21 of the snapshot
    assert_eq!(&frame[33..37], &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(frame.len(), 8 + 53);
}

#[test]
fn test_status_counters_accumulate_across_messages() {
    let mut tracker = StatusTracker::with_clock(Box::new(ManualClock::new()));

    tracker.add_bytes_received(1000);
    tracker.add_bytes_received(500);
    tracker.add_crlf(1);
    tracker.add_crlf(1);

    let message = tracker.create_status_message(StatusCode::Connect);
    let ClientMessage::Stat { status, .. } = message else {
        panic!("expected Stat");
    };

    assert_eq!(status.bytes_received, 1500);
    assert_eq!(status.crlf, 2);
}

#[test]
fn test_every_event_code_encodes_into_the_stat_payload() {
    let codes = [
        StatusCode::Connect,
        StatusCode::DecoderReady,
        StatusCode::StreamEstablished,
        StatusCode::Flushed,
        StatusCode::HeadersReceived,
        StatusCode::BufferThreshold,
        StatusCode::NotSupported,
        StatusCode::OutputUnderrun,
        StatusCode::Pause,
        StatusCode::Resume,
        StatusCode::TrackStarted,
        StatusCode::Timer,
        StatusCode::Underrun,
    ];

    let mut tracker = StatusTracker::new();
    for code in codes {
        let frame = codec::encode(&tracker.create_status_message(code));
        assert_eq!(&frame[8..12], &code.event_code());
    }
}

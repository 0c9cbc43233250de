//! Playback status reporting
//!
//! The server drives playback from STAT messages: every significant event in
//! the audio pipeline (decoder ready, buffer threshold reached, underrun, the
//! periodic timer) is reported as a [`StatusCode`] together with the current
//! counters. [`StatusTracker`] owns those counters, stamps the player uptime
//! from an injected [`MonotonicClock`], and builds the outbound message.

use crate::clock::{MonotonicClock, SystemClock};
use crate::messages::ClientMessage;

/// Serialized size of a [`StatusSnapshot`] in a STAT payload.
pub const STATUS_WIRE_LEN: usize = 49;

/// Counter block carried by every STAT message (49 bytes on the wire)
///
/// All fields are plain wire-width integers; the reserved word that follows
/// `crlf` on the wire is always zero and is not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    /// Count of carriage-return/line-feed pairs seen in stream headers
    pub crlf: u8,
    /// Size of the stream buffer in bytes
    pub buffer_size: u32,
    /// Bytes currently held in the stream buffer
    pub fullness: u32,
    /// Total stream bytes received from the server
    pub bytes_received: u64,
    pub signal_strength: u16,
    /// Player uptime in milliseconds, stamped from the tracker's clock
    pub jiffies_ms: u32,
    /// Size of the decoded-audio output buffer in bytes
    pub output_buffer_size: u32,
    /// Bytes currently held in the output buffer
    pub output_buffer_fullness: u32,
    /// Whole seconds of the current track played so far
    pub elapsed_seconds: u32,
    pub voltage: u16,
    /// Elapsed play time of the current track in milliseconds
    pub elapsed_ms: u32,
    /// Server timestamp echoed from the most recent strm command
    pub timestamp_ms: u32,
    pub error_code: u16,
}

/// Playback events reported to the server in STAT messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Connect,
    DecoderReady,
    StreamEstablished,
    Flushed,
    HeadersReceived,
    BufferThreshold,
    NotSupported,
    OutputUnderrun,
    Pause,
    Resume,
    TrackStarted,
    Timer,
    Underrun,
}

impl StatusCode {
    /// Four-byte event code carried in the STAT payload
    pub fn event_code(self) -> [u8; 4] {
        match self {
            StatusCode::Connect => *b"STMc",
            StatusCode::DecoderReady => *b"STMd",
            StatusCode::StreamEstablished => *b"STMe",
            StatusCode::Flushed => *b"STMf",
            StatusCode::HeadersReceived => *b"STMh",
            StatusCode::BufferThreshold => *b"STMl",
            StatusCode::NotSupported => *b"STMn",
            StatusCode::OutputUnderrun => *b"STMo",
            StatusCode::Pause => *b"STMp",
            StatusCode::Resume => *b"STMr",
            StatusCode::TrackStarted => *b"STMs",
            StatusCode::Timer => *b"STMt",
            StatusCode::Underrun => *b"STMu",
        }
    }
}

/// Owner of the mutable playback counters
///
/// The audio pipeline updates the tracker as bytes flow and calls
/// [`create_status_message`](StatusTracker::create_status_message) whenever
/// the server needs to hear about an event. Uptime is read from the injected
/// clock, never from the caller.
pub struct StatusTracker {
    status: StatusSnapshot,
    clock: Box<dyn MonotonicClock>,
}

impl StatusTracker {
    /// Creates a tracker whose uptime starts counting now
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock::new()))
    }

    /// Creates a tracker reading uptime from the given clock
    pub fn with_clock(clock: Box<dyn MonotonicClock>) -> Self {
        Self {
            status: StatusSnapshot::default(),
            clock,
        }
    }

    /// Current counter values
    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    pub fn set_crlf(&mut self, crlf: u8) {
        self.status.crlf = crlf;
    }

    /// Adds to the CRLF counter, wrapping at 256
    pub fn add_crlf(&mut self, count: u8) {
        self.status.crlf = self.status.crlf.wrapping_add(count);
    }

    pub fn set_buffer_size(&mut self, bytes: u32) {
        self.status.buffer_size = bytes;
    }

    pub fn set_fullness(&mut self, bytes: u32) {
        self.status.fullness = bytes;
    }

    pub fn set_bytes_received(&mut self, bytes: u64) {
        self.status.bytes_received = bytes;
    }

    /// Adds to the received-bytes counter, wrapping at 2^64
    pub fn add_bytes_received(&mut self, count: u64) {
        self.status.bytes_received = self.status.bytes_received.wrapping_add(count);
    }

    pub fn set_signal_strength(&mut self, strength: u16) {
        self.status.signal_strength = strength;
    }

    pub fn set_output_buffer_size(&mut self, bytes: u32) {
        self.status.output_buffer_size = bytes;
    }

    pub fn set_output_buffer_fullness(&mut self, bytes: u32) {
        self.status.output_buffer_fullness = bytes;
    }

    pub fn set_elapsed_seconds(&mut self, seconds: u32) {
        self.status.elapsed_seconds = seconds;
    }

    pub fn set_elapsed_ms(&mut self, millis: u32) {
        self.status.elapsed_ms = millis;
    }

    pub fn set_voltage(&mut self, voltage: u16) {
        self.status.voltage = voltage;
    }

    pub fn set_timestamp_ms(&mut self, millis: u32) {
        self.status.timestamp_ms = millis;
    }

    pub fn set_error_code(&mut self, code: u16) {
        self.status.error_code = code;
    }

    /// Builds a STAT message for the given event
    ///
    /// Refreshes `jiffies_ms` from the clock first; the uptime wraps at
    /// 2^32 milliseconds like every other counter.
    pub fn create_status_message(&mut self, code: StatusCode) -> ClientMessage {
        self.status.jiffies_ms = self.clock.elapsed().as_millis() as u32;
        ClientMessage::Stat {
            event_code: code.event_code(),
            status: self.status,
        }
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

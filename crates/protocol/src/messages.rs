//! Typed SlimProto messages
//!
//! Two closed sum types cover the whole protocol: [`ClientMessage`] for
//! everything a player sends (uppercase opcodes) and [`ServerMessage`] for
//! everything a server sends (lowercase opcodes). The codec in
//! [`crate::codec`] maps between these and wire bytes; nothing else in the
//! crate interprets payloads.

use std::net::Ipv4Addr;
use std::time::Duration;

use bytes::Bytes;

use crate::capability::CapabilitySet;
use crate::status::StatusSnapshot;
use crate::stream::Stream;

/// MAC address substituted when a [`Helo`] does not carry one
pub const FALLBACK_MAC: [u8; 6] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

/// Player identification sent as the first message of every session
#[derive(Debug, Clone, PartialEq)]
pub struct Helo {
    /// Device model id (squeezelite reports 12)
    pub device_id: u8,
    /// Firmware revision
    pub revision: u8,
    /// Player MAC address; `None` encodes [`FALLBACK_MAC`]
    pub mac: Option<[u8; 6]>,
    pub uuid: [u8; 16],
    pub wlan_channels: u16,
    /// Stream bytes received before this (re)connect
    pub bytes_received: u64,
    /// ISO 639-1 language code, e.g. `b"en"`
    pub language: [u8; 2],
    pub capabilities: CapabilitySet,
}

impl Helo {
    /// Creates a HELO for the given device identity with the stock
    /// capability set and defaults everywhere else
    pub fn new(device_id: u8, revision: u8) -> Self {
        Self {
            device_id,
            revision,
            mac: None,
            uuid: [0; 16],
            wlan_channels: 0,
            bytes_received: 0,
            language: *b"en",
            capabilities: CapabilitySet::with_defaults(),
        }
    }

    /// MAC address as it will appear on the wire
    pub fn effective_mac(&self) -> [u8; 6] {
        self.mac.unwrap_or(FALLBACK_MAC)
    }
}

/// Messages sent by the player
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Helo(Helo),
    /// Playback status report; `event_code` is one of the `STM?` codes
    Stat {
        event_code: [u8; 4],
        status: StatusSnapshot,
    },
    /// Graceful goodbye before closing the socket
    Bye { reason: u8 },
    /// Player name announcement
    SetName { name: String },
}

impl ClientMessage {
    /// Wire opcode for this message
    pub fn opcode(&self) -> &'static [u8; 4] {
        match self {
            ClientMessage::Helo(_) => b"HELO",
            ClientMessage::Stat { .. } => b"STAT",
            ClientMessage::Bye { .. } => b"BYE!",
            ClientMessage::SetName { .. } => b"SETD",
        }
    }
}

/// Messages sent by the server
///
/// Unrecognized opcodes decode to [`ServerMessage::Unknown`] rather than an
/// error so a newer server never desynchronizes an older player; the full
/// frame is preserved in `raw`.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Redirect to another server, optionally carrying a sync-group id
    Serv {
        ip: Ipv4Addr,
        sync_group_id: Option<String>,
    },
    /// Request for a periodic STAT report every `interval`
    StatusRequest { interval: Duration },
    /// Start fetching and decoding a stream
    Stream(Stream),
    /// Stop playback and discard buffers
    Stop,
    /// Discard buffered audio but keep the stream open
    Flush,
    Pause { timestamp: Duration },
    Unpause { timestamp: Duration },
    /// Skip ahead over the given span of audio
    Skip { timestamp: Duration },
    /// Toggle the S/PDIF and DAC outputs
    Enable { spdif: bool, dac: bool },
    /// Channel gain, unity = 1.0
    Gain { left: f64, right: f64 },
    /// Ask the player to report its name
    QueryName,
    /// Server-assigned player name
    SetNameRequest { name: String },
    DisableDac,
    /// Server version announcement
    Version { version: String },
    /// Opcode this player does not recognize; `raw` holds the whole frame
    Unknown { opcode: String, raw: Bytes },
}

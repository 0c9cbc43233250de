//! # Slimlink Protocol
//!
//! Wire model and codec for SlimProto, the protocol spoken between
//! Squeezebox-compatible players and a Lyrion / Logitech Media Server.
//!
//! This crate provides:
//! - `ClientMessage` / `ServerMessage`: typed messages for both directions
//! - `codec`: serialization of client messages and total decoding of server
//!   frames, with unknown opcodes preserved instead of rejected
//! - `CapabilitySet`: the player capability announcement carried in HELO
//! - `StatusTracker`: playback counters and STAT message construction
//! - `SessionState`: the session lifecycle state machine
//! - `MonotonicClock`: the uptime seam (`SystemClock` / `ManualClock`)
//!
//! Everything here is pure: no sockets, no clocks other than the injected
//! one, no suspension points. The companion `slimlink-client` crate owns the
//! I/O.
//!
//! ## Example
//!
//! ```
//! use slimlink_protocol::{codec, ClientMessage, ServerMessage};
//! use bytes::Bytes;
//!
//! // Encode a goodbye
//! let frame = codec::encode(&ClientMessage::Bye { reason: 0 });
//! assert_eq!(&frame[..], b"BYE!\x00\x00\x00\x01\x00");
//!
//! // Decode a server redirect
//! let message = codec::decode(Bytes::from_static(b"serv\xC0\xA8\x01\x64")).unwrap();
//! assert!(matches!(message, ServerMessage::Serv { .. }));
//! ```

pub mod capability;
pub mod clock;
pub mod codec;
pub mod error;
pub mod messages;
pub mod state;
pub mod status;
pub mod stream;
pub mod wire;

pub use capability::{Capability, CapabilitySet};
pub use clock::{ManualClock, MonotonicClock, SystemClock};
pub use codec::{decode, encode, MAX_FRAME_SIZE};
pub use error::{ProtocolError, Result};
pub use messages::{ClientMessage, Helo, ServerMessage, FALLBACK_MAC};
pub use state::SessionState;
pub use status::{StatusCode, StatusSnapshot, StatusTracker, STATUS_WIRE_LEN};
pub use stream::{
    AutoStart, PcmChannels, PcmEndian, PcmSampleRate, PcmSampleSize, SpdifEnable, Stream,
    StreamFlags, StreamFormat, TransitionType,
};

/// TCP and UDP port SlimProto servers listen on
pub const SLIMPROTO_PORT: u16 = 3483;

//! SlimProto codec
//!
//! The two directions of the protocol frame differently:
//!
//! ```text
//! client → server (encode):
//! ┌────────┬──────┬───────────┐
//! │ opcode │ u32  │  4 bytes  │  ASCII, uppercase
//! │ length │ u32  │  4 bytes  │  big-endian payload length
//! │ payload│ [u8] │  N bytes  │
//! └────────┴──────┴───────────┘
//!
//! server → client (decode):
//! the session strips a u16 big-endian length prefix and hands the codec
//! the remaining payload, which begins with a 4-byte lowercase opcode.
//! ```
//!
//! Decoding is total over anything the session can deliver: recognized
//! opcodes either parse or fail loudly with `Truncated`/`Malformed`, and
//! everything else — unknown opcodes, unknown `strm`/`setd` sub-commands,
//! even frames too short to carry an opcode — becomes
//! [`ServerMessage::Unknown`] with the full frame preserved.

use std::net::Ipv4Addr;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};
use crate::messages::{ClientMessage, Helo, ServerMessage};
use crate::status::StatusSnapshot;
use crate::stream::{
    AutoStart, PcmChannels, PcmEndian, PcmSampleRate, PcmSampleSize, SpdifEnable, Stream,
    StreamFlags, StreamFormat, TransitionType,
};
use crate::wire::{self, OPCODE_LEN};

/// Maximum inbound frame size accepted from a server.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Fixed portion of a HELO payload, before the capability string.
const HELO_FIXED_LEN: usize = 36;

/// Length of a `strm` command body that carries a millisecond field.
const MILLIS_BODY_LEN: usize = 17;

/// Fixed portion of a `strm s` command body, before the HTTP headers.
const STREAM_BODY_MIN: usize = 23;

/// Serializes a client message into its raw outbound frame
pub fn encode(message: &ClientMessage) -> Bytes {
    let payload = match message {
        ClientMessage::Helo(helo) => encode_helo(helo),
        ClientMessage::Stat { event_code, status } => encode_stat(event_code, status),
        ClientMessage::Bye { reason } => {
            let mut buf = BytesMut::with_capacity(1);
            buf.put_u8(*reason);
            buf
        }
        ClientMessage::SetName { name } => {
            let mut buf = BytesMut::with_capacity(1 + name.len());
            buf.put_u8(0x00);
            buf.put_slice(name.as_bytes());
            buf
        }
    };

    let mut frame = BytesMut::with_capacity(OPCODE_LEN + 4 + payload.len());
    frame.put_slice(message.opcode());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    frame.freeze()
}

fn encode_helo(helo: &Helo) -> BytesMut {
    let capabilities = helo.capabilities.render();
    let mut buf = BytesMut::with_capacity(HELO_FIXED_LEN + capabilities.len());
    buf.put_u8(helo.device_id);
    buf.put_u8(helo.revision);
    buf.put_slice(&helo.effective_mac());
    buf.put_slice(&helo.uuid);
    buf.put_u16(helo.wlan_channels);
    buf.put_u64(helo.bytes_received);
    buf.put_slice(&helo.language);
    buf.put_slice(capabilities.as_bytes());
    buf
}

fn encode_stat(event_code: &[u8; 4], status: &StatusSnapshot) -> BytesMut {
    let mut buf = BytesMut::with_capacity(4 + crate::status::STATUS_WIRE_LEN);
    buf.put_slice(event_code);
    buf.put_u8(status.crlf);
    buf.put_u16(0); // reserved
    buf.put_u32(status.buffer_size);
    buf.put_u32(status.fullness);
    buf.put_u64(status.bytes_received);
    buf.put_u16(status.signal_strength);
    buf.put_u32(status.jiffies_ms);
    buf.put_u32(status.output_buffer_size);
    buf.put_u32(status.output_buffer_fullness);
    buf.put_u32(status.elapsed_seconds);
    buf.put_u16(status.voltage);
    buf.put_u32(status.elapsed_ms);
    buf.put_u32(status.timestamp_ms);
    buf.put_u16(status.error_code);
    buf
}

/// Parses one de-framed server payload into a typed message
///
/// The input is a complete frame as read off the socket, opcode included,
/// length prefix already stripped.
pub fn decode(frame: Bytes) -> Result<ServerMessage> {
    if frame.len() < OPCODE_LEN {
        return Ok(ServerMessage::Unknown {
            opcode: String::from_utf8_lossy(&frame).into_owned(),
            raw: frame,
        });
    }

    let mut body = frame.clone();
    let opcode: [u8; OPCODE_LEN] = wire::read_array(&mut body)?;
    match &opcode {
        b"serv" => decode_serv(body),
        b"strm" => decode_strm(body, frame),
        b"aude" => decode_enable(body),
        b"audg" => decode_gain(body),
        b"vers" => decode_version(body),
        b"setd" => decode_setd(body, frame),
        _ => Ok(ServerMessage::Unknown {
            opcode: String::from_utf8_lossy(&opcode).into_owned(),
            raw: frame,
        }),
    }
}

fn decode_serv(mut body: Bytes) -> Result<ServerMessage> {
    let ip = Ipv4Addr::from(wire::read_array::<4>(&mut body)?);
    let sync_group_id = if body.is_empty() {
        None
    } else {
        Some(wire::read_string(&mut body)?)
    };
    Ok(ServerMessage::Serv { ip, sync_group_id })
}

fn decode_strm(mut body: Bytes, frame: Bytes) -> Result<ServerMessage> {
    let command = wire::read_u8(&mut body)?;
    match command {
        b't' => Ok(ServerMessage::StatusRequest {
            interval: read_millis_field(body)?,
        }),
        b's' => decode_stream_start(body),
        b'q' => Ok(ServerMessage::Stop),
        b'f' => Ok(ServerMessage::Flush),
        b'p' => Ok(ServerMessage::Pause {
            timestamp: read_millis_field(body)?,
        }),
        b'u' => Ok(ServerMessage::Unpause {
            timestamp: read_millis_field(body)?,
        }),
        b'a' => Ok(ServerMessage::Skip {
            timestamp: read_millis_field(body)?,
        }),
        other => Ok(ServerMessage::Unknown {
            opcode: format!("strm_{}", other as char),
            raw: frame,
        }),
    }
}

/// Reads the u32 millisecond field the timer-style `strm` commands carry at
/// offset 13 of their body
fn read_millis_field(mut body: Bytes) -> Result<Duration> {
    if body.len() < MILLIS_BODY_LEN {
        return Err(ProtocolError::Truncated {
            need: MILLIS_BODY_LEN,
            have: body.len(),
        });
    }
    let _ = wire::read_bytes(&mut body, 13)?;
    let millis = wire::read_u32(&mut body)?;
    Ok(Duration::from_millis(u64::from(millis)))
}

fn decode_stream_start(mut body: Bytes) -> Result<ServerMessage> {
    if body.len() < STREAM_BODY_MIN {
        return Err(ProtocolError::Truncated {
            need: STREAM_BODY_MIN,
            have: body.len(),
        });
    }

    let auto_start = AutoStart::from_code(wire::read_u8(&mut body)?)?;
    let format = StreamFormat::from_code(wire::read_u8(&mut body)?)?;
    let pcm_sample_size = PcmSampleSize::from_code(wire::read_u8(&mut body)?)?;
    let pcm_sample_rate = PcmSampleRate::from_code(wire::read_u8(&mut body)?)?;
    let pcm_channels = PcmChannels::from_code(wire::read_u8(&mut body)?)?;
    let pcm_endian = PcmEndian::from_code(wire::read_u8(&mut body)?)?;
    let threshold = u32::from(wire::read_u8(&mut body)?) * 1024;
    let spdif_enable = SpdifEnable::from_code(wire::read_u8(&mut body)?)?;
    let transition_period = Duration::from_secs(u64::from(wire::read_u8(&mut body)?));
    let transition_type = TransitionType::from_code(wire::read_u8(&mut body)?)?;
    let flags = StreamFlags::from_bits_truncate(wire::read_u8(&mut body)?);
    let output_threshold = Duration::from_millis(u64::from(wire::read_u8(&mut body)?) * 10);
    let _reserved = wire::read_u8(&mut body)?;
    let replay_gain = f64::from(wire::read_u32(&mut body)?) / 65536.0;
    let server_port = wire::read_u16(&mut body)?;
    let server_ip = Ipv4Addr::from(wire::read_array::<4>(&mut body)?);
    let http_headers = if body.is_empty() {
        None
    } else {
        Some(wire::read_string(&mut body)?)
    };

    Ok(ServerMessage::Stream(Stream {
        auto_start,
        format,
        pcm_sample_size,
        pcm_sample_rate,
        pcm_channels,
        pcm_endian,
        threshold,
        spdif_enable,
        transition_period,
        transition_type,
        flags,
        output_threshold,
        replay_gain,
        server_port,
        server_ip,
        http_headers,
    }))
}

fn decode_enable(mut body: Bytes) -> Result<ServerMessage> {
    let spdif = wire::read_u8(&mut body)? != 0;
    let dac = wire::read_u8(&mut body)? != 0;
    Ok(ServerMessage::Enable { spdif, dac })
}

fn decode_gain(mut body: Bytes) -> Result<ServerMessage> {
    // bytes 0..10 are legacy fields this player does not interpret
    let _ = wire::read_bytes(&mut body, 10)?;
    let left = f64::from(wire::read_u32(&mut body)?) / 65536.0;
    let right = f64::from(wire::read_u32(&mut body)?) / 65536.0;
    Ok(ServerMessage::Gain { left, right })
}

fn decode_version(mut body: Bytes) -> Result<ServerMessage> {
    Ok(ServerMessage::Version {
        version: wire::read_string(&mut body)?,
    })
}

fn decode_setd(mut body: Bytes, frame: Bytes) -> Result<ServerMessage> {
    let id = wire::read_u8(&mut body)?;
    match id {
        0 if body.is_empty() => Ok(ServerMessage::QueryName),
        0 => {
            // the final byte is a NUL terminator and is dropped
            let len = body.len() - 1;
            let name = wire::read_bytes(&mut body, len)?;
            let name = String::from_utf8(name.to_vec())
                .map_err(|_| ProtocolError::Malformed("invalid UTF-8 in player name".into()))?;
            Ok(ServerMessage::SetNameRequest { name })
        }
        4 => Ok(ServerMessage::DisableDac),
        other => Ok(ServerMessage::Unknown {
            opcode: format!("setd_{other}"),
            raw: frame,
        }),
    }
}

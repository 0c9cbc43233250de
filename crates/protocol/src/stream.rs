//! Start-stream command payload
//!
//! The `strm s` command tells the player everything it needs to fetch and
//! decode a track: transport behavior, codec, PCM parameters for raw
//! streams, buffering thresholds, transition handling, and where to connect.
//! Most fields are single ASCII characters on the wire; `'?'` means the
//! stream describes itself (header-bearing formats like FLAC or Ogg).

use std::net::Ipv4Addr;
use std::time::Duration;

use bitflags::bitflags;

use crate::error::{ProtocolError, Result};

/// How the player should begin playback once the buffer threshold is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStart {
    /// Wait for an explicit unpause from the server
    None,
    Auto,
    /// Connect straight to the source, server not proxying
    Direct,
    AutoDirect,
}

impl AutoStart {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'0' => Ok(AutoStart::None),
            b'1' => Ok(AutoStart::Auto),
            b'2' => Ok(AutoStart::Direct),
            b'3' => Ok(AutoStart::AutoDirect),
            other => Err(ProtocolError::Malformed(format!(
                "invalid auto-start code {:?}",
                other as char
            ))),
        }
    }
}

/// Audio format of the incoming stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    Pcm,
    Mp3,
    Flac,
    Wma,
    Ogg,
    Aac,
    Alac,
}

impl StreamFormat {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'p' => Ok(StreamFormat::Pcm),
            b'm' => Ok(StreamFormat::Mp3),
            b'f' => Ok(StreamFormat::Flac),
            b'w' => Ok(StreamFormat::Wma),
            b'o' => Ok(StreamFormat::Ogg),
            b'a' => Ok(StreamFormat::Aac),
            b'l' => Ok(StreamFormat::Alac),
            other => Err(ProtocolError::Malformed(format!(
                "invalid stream format code {:?}",
                other as char
            ))),
        }
    }
}

/// Bits per PCM sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmSampleSize {
    Bits8,
    Bits16,
    Bits20,
    Bits32,
    /// The stream header carries the sample size
    SelfDescribing,
}

impl PcmSampleSize {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'0' => Ok(PcmSampleSize::Bits8),
            b'1' => Ok(PcmSampleSize::Bits16),
            b'2' => Ok(PcmSampleSize::Bits20),
            b'3' => Ok(PcmSampleSize::Bits32),
            b'?' => Ok(PcmSampleSize::SelfDescribing),
            other => Err(ProtocolError::Malformed(format!(
                "invalid PCM sample size code {:?}",
                other as char
            ))),
        }
    }
}

/// PCM sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmSampleRate {
    Rate8000,
    Rate11025,
    Rate12000,
    Rate16000,
    Rate22050,
    Rate24000,
    Rate32000,
    Rate44100,
    Rate48000,
    Rate96000,
    /// The stream header carries the sample rate
    SelfDescribing,
}

impl PcmSampleRate {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'0' => Ok(PcmSampleRate::Rate11025),
            b'1' => Ok(PcmSampleRate::Rate22050),
            b'2' => Ok(PcmSampleRate::Rate32000),
            b'3' => Ok(PcmSampleRate::Rate44100),
            b'4' => Ok(PcmSampleRate::Rate48000),
            b'5' => Ok(PcmSampleRate::Rate8000),
            b'6' => Ok(PcmSampleRate::Rate12000),
            b'7' => Ok(PcmSampleRate::Rate16000),
            b'8' => Ok(PcmSampleRate::Rate24000),
            b'9' => Ok(PcmSampleRate::Rate96000),
            b'?' => Ok(PcmSampleRate::SelfDescribing),
            other => Err(ProtocolError::Malformed(format!(
                "invalid PCM sample rate code {:?}",
                other as char
            ))),
        }
    }

    /// Sample rate in Hz, if the stream does not describe itself
    pub fn hz(&self) -> Option<u32> {
        match self {
            PcmSampleRate::Rate8000 => Some(8_000),
            PcmSampleRate::Rate11025 => Some(11_025),
            PcmSampleRate::Rate12000 => Some(12_000),
            PcmSampleRate::Rate16000 => Some(16_000),
            PcmSampleRate::Rate22050 => Some(22_050),
            PcmSampleRate::Rate24000 => Some(24_000),
            PcmSampleRate::Rate32000 => Some(32_000),
            PcmSampleRate::Rate44100 => Some(44_100),
            PcmSampleRate::Rate48000 => Some(48_000),
            PcmSampleRate::Rate96000 => Some(96_000),
            PcmSampleRate::SelfDescribing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmChannels {
    Mono,
    Stereo,
    SelfDescribing,
}

impl PcmChannels {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'1' => Ok(PcmChannels::Mono),
            b'2' => Ok(PcmChannels::Stereo),
            b'?' => Ok(PcmChannels::SelfDescribing),
            other => Err(ProtocolError::Malformed(format!(
                "invalid PCM channel code {:?}",
                other as char
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEndian {
    Big,
    Little,
    SelfDescribing,
}

impl PcmEndian {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'0' => Ok(PcmEndian::Big),
            b'1' => Ok(PcmEndian::Little),
            b'?' => Ok(PcmEndian::SelfDescribing),
            other => Err(ProtocolError::Malformed(format!(
                "invalid PCM endian code {:?}",
                other as char
            ))),
        }
    }
}

/// S/PDIF output behavior while the stream plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpdifEnable {
    Auto,
    On,
    Off,
}

impl SpdifEnable {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SpdifEnable::Auto),
            1 => Ok(SpdifEnable::On),
            2 => Ok(SpdifEnable::Off),
            other => Err(ProtocolError::Malformed(format!(
                "invalid S/PDIF enable value {other}"
            ))),
        }
    }
}

/// Fade applied when entering or leaving the track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    None,
    Crossfade,
    FadeIn,
    FadeOut,
    FadeInOut,
}

impl TransitionType {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'0' => Ok(TransitionType::None),
            b'1' => Ok(TransitionType::Crossfade),
            b'2' => Ok(TransitionType::FadeIn),
            b'3' => Ok(TransitionType::FadeOut),
            b'4' => Ok(TransitionType::FadeInOut),
            other => Err(ProtocolError::Malformed(format!(
                "invalid transition type code {:?}",
                other as char
            ))),
        }
    }
}

bitflags! {
    /// Stream behavior flags
    ///
    /// Bits 2-5 are reserved and ignored on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StreamFlags: u8 {
        const INVERT_POLARITY_LEFT = 0b0000_0001;
        const INVERT_POLARITY_RIGHT = 0b0000_0010;
        const NO_RESTART_DECODER = 0b0100_0000;
        const INFINITE_LOOP = 0b1000_0000;
    }
}

/// Decoded `strm s` command
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub auto_start: AutoStart,
    pub format: StreamFormat,
    pub pcm_sample_size: PcmSampleSize,
    pub pcm_sample_rate: PcmSampleRate,
    pub pcm_channels: PcmChannels,
    pub pcm_endian: PcmEndian,
    /// Buffer fill level at which playback may start, in bytes
    pub threshold: u32,
    pub spdif_enable: SpdifEnable,
    pub transition_period: Duration,
    pub transition_type: TransitionType,
    pub flags: StreamFlags,
    /// Output buffer fill level before playback starts
    pub output_threshold: Duration,
    /// Per-track loudness correction factor (1.0 = unity)
    pub replay_gain: f64,
    pub server_port: u16,
    pub server_ip: Ipv4Addr,
    /// HTTP request header block to send when fetching the stream
    pub http_headers: Option<String>,
}

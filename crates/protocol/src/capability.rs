//! Player capability advertisement
//!
//! A player announces what it can do in its HELO message as a single
//! comma-separated ASCII string, e.g.
//! `flc,pcm,mp3,Model=squeezelite,HasDigitalOut=1`. The server uses the
//! string to decide which formats to stream and which commands to send.
//!
//! [`CapabilitySet`] keeps entries in insertion order. Re-adding a
//! predefined capability replaces the earlier entry (the old one is removed,
//! the new one appended), so the last value wins while custom tokens stack
//! freely.

use std::fmt;
use std::mem;

use crate::error::{ProtocolError, Result};

/// One entry of the capability string
///
/// Predefined entries carry their value where the protocol expects one;
/// [`Capability::Custom`] passes an arbitrary token through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Wma,
    Wmap,
    Wmal,
    Ogg,
    Flc,
    Pcm,
    Aif,
    Mp3,
    Alc,
    Aac,
    /// Highest PCM sample rate the player accepts, in Hz
    MaxSampleRate(u32),
    Model(String),
    ModelName(String),
    Rhap,
    AccuratePlayPoints,
    SyncgroupId(String),
    HasDigitalOut,
    HasPreAmp,
    HasDisableDac,
    Firmware(String),
    Balance,
    CanHttps,
    /// Raw token appended to the capability string unchanged
    Custom(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Wma => write!(f, "wma"),
            Capability::Wmap => write!(f, "wmap"),
            Capability::Wmal => write!(f, "wmal"),
            Capability::Ogg => write!(f, "ogg"),
            Capability::Flc => write!(f, "flc"),
            Capability::Pcm => write!(f, "pcm"),
            Capability::Aif => write!(f, "aif"),
            Capability::Mp3 => write!(f, "mp3"),
            Capability::Alc => write!(f, "alc"),
            Capability::Aac => write!(f, "aac"),
            Capability::MaxSampleRate(rate) => write!(f, "MaxSampleRate={rate}"),
            Capability::Model(value) => write!(f, "Model={value}"),
            Capability::ModelName(value) => write!(f, "ModelName={value}"),
            Capability::Rhap => write!(f, "Rhap"),
            Capability::AccuratePlayPoints => write!(f, "AccuratePlayPoints=1"),
            Capability::SyncgroupId(value) => write!(f, "SyncgroupID={value}"),
            Capability::HasDigitalOut => write!(f, "HasDigitalOut=1"),
            Capability::HasPreAmp => write!(f, "HasPreAmp=1"),
            Capability::HasDisableDac => write!(f, "HasDisableDac=1"),
            Capability::Firmware(value) => write!(f, "Firmware={value}"),
            Capability::Balance => write!(f, "Balance=1"),
            Capability::CanHttps => write!(f, "CanHTTPS=1"),
            Capability::Custom(token) => write!(f, "{token}"),
        }
    }
}

/// Ordered set of capabilities rendered into the HELO message
///
/// # Example
///
/// ```
/// use slimlink_protocol::capability::{Capability, CapabilitySet};
///
/// let mut capabilities = CapabilitySet::new();
/// capabilities.add(Capability::Mp3).unwrap();
/// capabilities.add(Capability::Model("squeezelite".into())).unwrap();
///
/// assert_eq!(capabilities.render(), "mp3,Model=squeezelite");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    entries: Vec<Capability>,
}

impl CapabilitySet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the stock squeezelite-compatible announcement:
    /// `Model=squeezelite, ModelName=SqueezeLite, AccuratePlayPoints=1,
    /// HasDigitalOut=1, HasPreAmp=1, HasDisableDac=1`
    pub fn with_defaults() -> Self {
        Self {
            entries: vec![
                Capability::Model("squeezelite".into()),
                Capability::ModelName("SqueezeLite".into()),
                Capability::AccuratePlayPoints,
                Capability::HasDigitalOut,
                Capability::HasPreAmp,
                Capability::HasDisableDac,
            ],
        }
    }

    /// Adds a capability to the end of the set
    ///
    /// A predefined capability whose tag is already present replaces the
    /// earlier entry; custom tokens are never deduplicated. An empty custom
    /// token is rejected with [`ProtocolError::InvalidArgument`].
    pub fn add(&mut self, capability: Capability) -> Result<()> {
        if let Capability::Custom(token) = &capability {
            if token.is_empty() {
                return Err(ProtocolError::InvalidArgument(
                    "custom capability token is empty".into(),
                ));
            }
        } else {
            let tag = mem::discriminant(&capability);
            self.entries
                .retain(|existing| mem::discriminant(existing) != tag);
        }
        self.entries.push(capability);
        Ok(())
    }

    /// Renders the comma-separated capability string, in insertion order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(Capability::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns true if no capabilities have been added
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_tags_render_lowercase() {
        let mut set = CapabilitySet::new();
        for capability in [
            Capability::Wma,
            Capability::Wmap,
            Capability::Wmal,
            Capability::Ogg,
            Capability::Flc,
            Capability::Pcm,
            Capability::Aif,
            Capability::Mp3,
            Capability::Alc,
            Capability::Aac,
        ] {
            set.add(capability).unwrap();
        }

        assert_eq!(set.render(), "wma,wmap,wmal,ogg,flc,pcm,aif,mp3,alc,aac");
    }

    #[test]
    fn test_valued_tags_render_with_value() {
        let mut set = CapabilitySet::new();
        set.add(Capability::MaxSampleRate(192_000)).unwrap();
        set.add(Capability::SyncgroupId("abc123".into())).unwrap();
        set.add(Capability::Firmware("v1.9".into())).unwrap();

        assert_eq!(
            set.render(),
            "MaxSampleRate=192000,SyncgroupID=abc123,Firmware=v1.9"
        );
    }

    #[test]
    fn test_flag_tags_render_as_one() {
        let mut set = CapabilitySet::new();
        set.add(Capability::Rhap).unwrap();
        set.add(Capability::Balance).unwrap();
        set.add(Capability::CanHttps).unwrap();
        set.add(Capability::HasDisableDac).unwrap();

        assert_eq!(set.render(), "Rhap,Balance=1,CanHTTPS=1,HasDisableDac=1");
    }

    #[test]
    fn test_duplicate_predefined_replaces_and_moves_to_end() {
        let mut set = CapabilitySet::new();
        set.add(Capability::Model("squeezelite".into())).unwrap();
        set.add(Capability::Mp3).unwrap();
        set.add(Capability::Model("transporter".into())).unwrap();

        assert_eq!(set.render(), "mp3,Model=transporter");
    }

    #[test]
    fn test_same_value_twice_is_idempotent() {
        let mut once = CapabilitySet::new();
        once.add(Capability::Flc).unwrap();

        let mut twice = CapabilitySet::new();
        twice.add(Capability::Flc).unwrap();
        twice.add(Capability::Flc).unwrap();

        assert_eq!(once.render(), twice.render());
    }

    #[test]
    fn test_custom_entries_stack() {
        let mut set = CapabilitySet::new();
        set.add(Capability::Custom("Spotify".into())).unwrap();
        set.add(Capability::Custom("Spotify".into())).unwrap();

        assert_eq!(set.render(), "Spotify,Spotify");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_custom_token_rejected() {
        let mut set = CapabilitySet::new();
        let err = set.add(Capability::Custom(String::new())).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            CapabilitySet::with_defaults().render(),
            "Model=squeezelite,ModelName=SqueezeLite,AccuratePlayPoints=1,\
             HasDigitalOut=1,HasPreAmp=1,HasDisableDac=1"
        );
    }

    #[test]
    fn test_empty_set_renders_empty() {
        assert_eq!(CapabilitySet::new().render(), "");
    }
}

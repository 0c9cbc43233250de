//! # Slimlink
//!
//! A client-side implementation of the SlimProto protocol spoken between
//! Squeezebox-compatible players and a Lyrion / Logitech Media Server.
//!
//! ## Components
//!
//! - `slimlink-protocol`: wire model, codec, capabilities, and status tracking
//! - `slimlink-client`: framed TCP session and UDP server discovery
//!
//! The crates expose typed messages only; fetching, decoding, and playing the
//! audio a server points the player at is the consumer's job.

pub use slimlink_client as client;
pub use slimlink_protocol as protocol;

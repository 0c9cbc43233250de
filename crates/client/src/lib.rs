//! # Slimlink Client
//!
//! Networking half of the SlimProto implementation: a framed TCP
//! [`Session`] that speaks to a server through typed messages, and UDP
//! broadcast [`Discovery`] that finds one to talk to.
//!
//! ## Example
//!
//! ```no_run
//! use slimlink_client::{Discovery, Session};
//! use slimlink_protocol::Helo;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = Discovery::new();
//! let Some(server) = discovery.discover(Some(Duration::from_secs(10))).await? else {
//!     return Ok(());
//! };
//!
//! let mut session = Session::new();
//! session.connect(server.endpoint().into(), Helo::new(12, 0)).await?;
//!
//! loop {
//!     let message = session.receive().await?;
//!     println!("server: {message:?}");
//! }
//! # }
//! ```

pub mod connector;
pub mod discovery;
pub mod error;
pub mod session;

pub use connector::{Connector, TcpConnector};
pub use discovery::{parse_tlv, Discovery, Server, TlvValue};
pub use error::{DiscoveryError, SessionError};
pub use session::{Session, BYE_REASON_NORMAL};

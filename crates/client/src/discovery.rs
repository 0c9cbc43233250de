//! UDP server discovery
//!
//! A player finds its server by shouting on the local network: it broadcasts
//! a short request to UDP port 3483 and waits for any server to answer. The
//! reply starts with an ASCII `'E'` and carries a TLV-encoded description of
//! the server (name, version, address, HTTP port).
//!
//! The SlimProto endpoint is always the advertiser's source address on port
//! 3483 — the source UDP port of the reply is ephemeral and ignored, and the
//! `JSON` record advertises the HTTP/JSON-RPC port, not the protocol port.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use slimlink_protocol::SLIMPROTO_PORT;
use tokio::net::UdpSocket;
use tokio::time;

use crate::error::DiscoveryError;

/// Payload broadcast to solicit server advertisements.
const DISCOVERY_REQUEST: &[u8] = b"eNAME\0IPAD\0JSON\0VERS";

const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

/// Largest advertisement datagram we accept.
const MAX_DATAGRAM_LEN: usize = 1500;

/// One decoded record of a server advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    /// `NAME`: server name as configured by its owner
    Name(String),
    /// `VERS`: server software version
    Version(String),
    /// `IPAD`: server address as the server believes it to be
    Address(Ipv4Addr),
    /// `JSON`: HTTP/JSON-RPC port
    Port(u16),
}

/// A discovered server
///
/// Produced by [`Discovery::discover`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    endpoint: SocketAddrV4,
    tlv: HashMap<String, TlvValue>,
}

impl Server {
    fn from_advertisement(ip: Ipv4Addr, payload: &[u8]) -> Self {
        Self {
            endpoint: SocketAddrV4::new(ip, SLIMPROTO_PORT),
            tlv: parse_tlv(payload),
        }
    }

    /// SlimProto endpoint to open a session against (always port 3483)
    pub fn endpoint(&self) -> SocketAddrV4 {
        self.endpoint
    }

    /// All records of the advertisement, keyed by token
    pub fn tlv(&self) -> &HashMap<String, TlvValue> {
        &self.tlv
    }

    /// Advertised server name
    pub fn name(&self) -> Option<&str> {
        match self.tlv.get("NAME") {
            Some(TlvValue::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Advertised software version
    pub fn version(&self) -> Option<&str> {
        match self.tlv.get("VERS") {
            Some(TlvValue::Version(version)) => Some(version),
            _ => None,
        }
    }

    /// Address the server advertises for itself
    pub fn address(&self) -> Option<Ipv4Addr> {
        match self.tlv.get("IPAD") {
            Some(TlvValue::Address(address)) => Some(*address),
            _ => None,
        }
    }

    /// Advertised HTTP/JSON-RPC port
    pub fn http_port(&self) -> Option<u16> {
        match self.tlv.get("JSON") {
            Some(TlvValue::Port(port)) => Some(*port),
            _ => None,
        }
    }
}

/// Parses the TLV block of a server advertisement
///
/// Records are `token[4] + length + value`. The parser stops cleanly at
/// anything it cannot make sense of — a truncated tail, a non-printable
/// token, a length overrunning the buffer — and keeps whatever it decoded so
/// far. Records with unparseable values are skipped, unknown tokens are
/// skipped with their length consumed, and a repeated token overwrites the
/// earlier record.
pub fn parse_tlv(data: &[u8]) -> HashMap<String, TlvValue> {
    let mut records = HashMap::new();
    let mut cursor = data;

    while cursor.len() >= 5 {
        let token = &cursor[..4];
        if !(0x20..=0x7E).contains(&token[0]) {
            break;
        }
        let len = usize::from(cursor[4]);
        if len > cursor.len() - 5 {
            break;
        }
        let value = &cursor[5..5 + len];
        cursor = &cursor[5 + len..];

        match token {
            b"NAME" => {
                records.insert(
                    "NAME".to_string(),
                    TlvValue::Name(String::from_utf8_lossy(value).into_owned()),
                );
            }
            b"VERS" => {
                records.insert(
                    "VERS".to_string(),
                    TlvValue::Version(String::from_utf8_lossy(value).into_owned()),
                );
            }
            b"IPAD" => {
                match std::str::from_utf8(value)
                    .ok()
                    .and_then(|text| text.parse::<Ipv4Addr>().ok())
                {
                    Some(address) => {
                        records.insert("IPAD".to_string(), TlvValue::Address(address));
                    }
                    None => tracing::debug!("skipping unparseable IPAD record"),
                }
            }
            b"JSON" => {
                match std::str::from_utf8(value)
                    .ok()
                    .and_then(|text| text.parse::<u16>().ok())
                {
                    Some(port) => {
                        records.insert("JSON".to_string(), TlvValue::Port(port));
                    }
                    None => tracing::debug!("skipping unparseable JSON record"),
                }
            }
            other => {
                tracing::trace!(
                    token = %String::from_utf8_lossy(other),
                    "skipping unrecognized record"
                );
            }
        }
    }

    records
}

/// Server discovery over UDP broadcast
///
/// Every [`discover`](Discovery::discover) call binds a fresh socket, so one
/// `Discovery` value can be shared freely.
///
/// ```no_run
/// use slimlink_client::Discovery;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), slimlink_client::DiscoveryError> {
/// let discovery = Discovery::new();
/// match discovery.discover(Some(Duration::from_secs(15))).await? {
///     Some(server) => println!("found {:?} at {}", server.name(), server.endpoint()),
///     None => println!("no server answered"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Discovery {
    bind_addr: SocketAddr,
    broadcast_interval: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
        }
    }
}

impl Discovery {
    /// Creates a discovery service broadcasting from any local address
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the broadcast socket to a specific local address
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Overrides the re-broadcast interval (default 5 s)
    pub fn with_broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval = interval;
        self
    }

    /// Broadcasts until a server answers or the timeout expires
    ///
    /// Returns `Ok(None)` when the timeout passes without a valid answer;
    /// with no timeout the search runs until cancelled (dropping the future
    /// also yields nothing partial).
    pub async fn discover(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<Server>, DiscoveryError> {
        let socket = UdpSocket::bind(self.bind_addr).await?;
        socket.set_broadcast(true)?;

        let search = self.await_advertisement(&socket);
        match timeout {
            Some(limit) => match time::timeout(limit, search).await {
                Ok(found) => found.map(Some),
                Err(_) => {
                    tracing::info!("discovery timed out");
                    Ok(None)
                }
            },
            None => search.await.map(Some),
        }
    }

    async fn await_advertisement(&self, socket: &UdpSocket) -> Result<Server, DiscoveryError> {
        let target = SocketAddr::from((Ipv4Addr::BROADCAST, SLIMPROTO_PORT));
        let mut ticker = time::interval(self.broadcast_interval);
        let mut buf = [0u8; MAX_DATAGRAM_LEN];

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!(%target, "sending discovery broadcast");
                    socket.send_to(DISCOVERY_REQUEST, target).await?;
                }
                received = socket.recv_from(&mut buf) => {
                    let (len, source) = received?;
                    let datagram = &buf[..len];
                    if datagram.first() != Some(&b'E') {
                        tracing::trace!(%source, len, "ignoring unrelated datagram");
                        continue;
                    }
                    let IpAddr::V4(ip) = source.ip() else {
                        continue;
                    };
                    tracing::info!(%source, "server advertisement received");
                    return Ok(Server::from_advertisement(ip, &datagram[1..]));
                }
            }
        }
    }
}

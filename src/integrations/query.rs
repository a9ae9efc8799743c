//! A2S_INFO game server query over UDP.
//!
//! The exchange itself is blocking (`std::net::UdpSocket` with a read
//! timeout); [`QueryClient::info`] moves it onto tokio's blocking pool so a
//! slow or dead server never stalls the gateway or the IP watcher.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

const SINGLE_PACKET: [u8; 4] = [0xFF; 4];
const A2S_INFO: u8 = 0x54;
const A2S_INFO_PAYLOAD: &[u8] = b"Source Engine Query\0";
const S2C_CHALLENGE: u8 = 0x41;
const S2A_INFO: u8 = 0x49;
const MAX_PACKET: usize = 1400;
/// A server may answer with at most this many challenges before giving up.
const MAX_CHALLENGES: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("no reply from {addr} within {timeout:?}")]
    Timeout { addr: SocketAddr, timeout: Duration },

    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("malformed reply: {0}")]
    Malformed(String),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query worker failed: {0}")]
    Worker(String),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub protocol: u8,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub app_id: u16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Challenge([u8; 4]),
    Info(ServerInfo),
}

/// Build an A2S_INFO request, appending the challenge when the server asked for one.
pub fn build_request(challenge: Option<[u8; 4]>) -> Vec<u8> {
    let mut packet = Vec::with_capacity(SINGLE_PACKET.len() + 1 + A2S_INFO_PAYLOAD.len() + 4);
    packet.extend_from_slice(&SINGLE_PACKET);
    packet.push(A2S_INFO);
    packet.extend_from_slice(A2S_INFO_PAYLOAD);
    if let Some(challenge) = challenge {
        packet.extend_from_slice(&challenge);
    }
    packet
}

pub fn parse_reply(data: &[u8]) -> Result<Reply, QueryError> {
    let mut cursor = Cursor::new(data);

    let header: [u8; 4] = cursor.take(4)?.try_into().unwrap_or_default();
    if header != SINGLE_PACKET {
        return Err(QueryError::Malformed(
            "split or unknown packet header".into(),
        ));
    }

    match cursor.u8()? {
        S2C_CHALLENGE => {
            let challenge: [u8; 4] = cursor.take(4)?.try_into().unwrap_or_default();
            Ok(Reply::Challenge(challenge))
        }
        S2A_INFO => Ok(Reply::Info(ServerInfo {
            protocol: cursor.u8()?,
            name: cursor.cstring()?,
            map: cursor.cstring()?,
            folder: cursor.cstring()?,
            game: cursor.cstring()?,
            app_id: cursor.u16_le()?,
            players: cursor.u8()?,
            max_players: cursor.u8()?,
            bots: cursor.u8()?,
        })),
        other => Err(QueryError::Malformed(format!(
            "unexpected response type 0x{other:02X}"
        ))),
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], QueryError> {
        let end = self.pos + len;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| QueryError::Malformed(format!("reply truncated at byte {}", self.pos)))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, QueryError> {
        Ok(self.take(1)?[0])
    }

    fn u16_le(&mut self) -> Result<u16, QueryError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn cstring(&mut self) -> Result<String, QueryError> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| QueryError::Malformed("unterminated string".into()))?;
        let value = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(value)
    }
}

/// Blocking A2S_INFO exchange. `timeout` bounds the whole exchange,
/// challenge round included.
pub fn query_info(host: &str, port: u16, timeout: Duration) -> Result<ServerInfo, QueryError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|_| QueryError::Resolve(format!("{host}:{port}")))?
        .next()
        .ok_or_else(|| QueryError::Resolve(format!("{host}:{port}")))?;

    let bind: SocketAddr = if addr.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let socket = UdpSocket::bind(bind)?;

    let deadline = Instant::now() + timeout;
    let timed_out = || QueryError::Timeout { addr, timeout };
    let mut buf = [0u8; MAX_PACKET];
    let mut challenge = None;

    for _ in 0..=MAX_CHALLENGES {
        socket.send_to(&build_request(challenge), addr)?;

        let len = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out());
            }
            socket.set_read_timeout(Some(remaining))?;

            match socket.recv_from(&mut buf) {
                Ok((len, from)) if from == addr => break len,
                // stray datagram from someone else
                Ok(_) => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(timed_out());
                }
                Err(e) => return Err(e.into()),
            }
        };

        match parse_reply(&buf[..len])? {
            Reply::Info(info) => return Ok(info),
            Reply::Challenge(c) => challenge = Some(c),
        }
    }

    Err(QueryError::Malformed(
        "server kept answering with challenges".into(),
    ))
}

/// Async front for [`query_info`] bound to one server.
#[derive(Debug, Clone)]
pub struct QueryClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl QueryClient {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Same server, different timeout for a single call site.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn info(&self) -> Result<ServerInfo, QueryError> {
        let host = self.host.clone();
        let (port, timeout) = (self.port, self.timeout);
        tokio::task::spawn_blocking(move || query_info(&host, port, timeout))
            .await
            .map_err(|e| QueryError::Worker(e.to_string()))?
    }
}

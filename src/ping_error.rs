use std::io;
use thiserror::Error;

pub type PingResult<T> = std::result::Result<T, PingError>;

/// Everything that can make a probe run fail.
///
/// A single lost packet is never an error; it only shows up as loss in the statistics.
#[derive(Error, Debug)]
pub enum PingError {
    #[error("cannot resolve host {host}")]
    HostUnreachable {
        host: String,
        #[source]
        source: Option<io::Error>,
    },
    #[error("raw ICMP sockets require root privileges or CAP_NET_RAW: {0}")]
    PermissionDenied(#[source] io::Error),
    #[error("no reply from {host} after {count} attempts")]
    PingTimeout { host: String, count: u16 },
    #[error("ICMP destination unreachable (code {code}): {reason}")]
    DestinationUnreachable { code: u8, reason: &'static str },
    #[error("malformed packet: {0}")]
    PacketError(String),
    #[error("socket error: {0}")]
    TransportError(#[from] io::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

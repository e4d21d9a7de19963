use crate::details::icmp::codec::TIMESTAMP_SIZE;
use crate::details::icmp::{AddressFamily, RawSocket, TSocket};
use crate::details::probe_loop::ProbeLoop;
use crate::details::{resolver, statistics};
use crate::{PingError, PingResult, PingStatistics};
use std::net::IpAddr;
use std::time::Duration;

/// Largest echo payload that fits into an IPv4 datagram.
pub const MAX_PAYLOAD_SIZE: usize = 65_507;
pub const MAX_DSCP: u8 = 63;

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct ProbeConfig<'a> {
    /// Host name or IPv4/IPv6 address literal.
    pub host: &'a str,
    pub count: u16,
    /// How long to wait for each reply.
    pub timeout: Duration,
    /// Pause between a reply (or timeout) and the next request.
    pub interval: Duration,
    /// Echo payload size in bytes, at least 8 for the send timestamp.
    pub size: usize,
    /// Differentiated services code point, 0-63.
    pub dscp: Option<u8>,
    /// ICMP identifier of the run; a random one is drawn when `None`.
    pub identifier: Option<u16>,
}

impl<'a> ProbeConfig<'a> {
    pub fn new(host: &'a str) -> Self {
        ProbeConfig {
            host,
            count: 1,
            timeout: Duration::from_secs(1),
            interval: Duration::from_millis(100),
            size: 56,
            dscp: None,
            identifier: None,
        }
    }

    fn validate(&self) -> PingResult<()> {
        if self.count == 0 {
            return Err(PingError::InvalidArgument("count must be at least 1".to_owned()));
        }
        if self.timeout.is_zero() {
            return Err(PingError::InvalidArgument("timeout must be positive".to_owned()));
        }
        if self.size < TIMESTAMP_SIZE || self.size > MAX_PAYLOAD_SIZE {
            return Err(PingError::InvalidArgument(format!(
                "size {} is outside of {TIMESTAMP_SIZE}..={MAX_PAYLOAD_SIZE} bytes",
                self.size
            )));
        }
        match self.dscp {
            Some(dscp) if dscp > MAX_DSCP => {
                Err(PingError::InvalidArgument(format!("dscp {dscp} is outside of 0..={MAX_DSCP}")))
            }
            _ => Ok(()),
        }
    }
}

/// Pings `config.host` `config.count` times, one request in flight at a time.
///
/// Fails with [`PingError::PingTimeout`] when not a single reply arrived. Needs the privilege
/// to open raw sockets, otherwise [`PingError::PermissionDenied`] is returned.
pub fn probe(config: &ProbeConfig<'_>) -> PingResult<PingStatistics> {
    config.validate()?;
    let (family, ip_addr) = resolver::resolve(config.host)?;

    let socket = RawSocket::open(family)?;
    if let Some(dscp) = config.dscp {
        socket.set_traffic_class(dscp)?;
    }
    let result = probe_with_socket(config, family, ip_addr, &socket);
    socket.close();
    result
}

fn probe_with_socket<S>(
    config: &ProbeConfig<'_>,
    family: AddressFamily,
    ip_addr: IpAddr,
    socket: &S,
) -> PingResult<PingStatistics>
where
    S: TSocket,
{
    let identifier = config.identifier.unwrap_or_else(rand::random);
    tracing::debug!(host = config.host, %ip_addr, %family, identifier, count = config.count, "starting probe run");

    let mut probe_loop = ProbeLoop::new(socket, ip_addr, identifier, config.size, config.timeout, config.interval);
    let record = probe_loop.run(config.count)?;
    tracing::debug!(
        state = ?probe_loop.state(),
        sent = record.sent,
        received = record.received(),
        lost = record.lost(),
        "probe run finished"
    );

    if record.received() == 0 {
        return Err(PingError::PingTimeout { host: config.host.to_owned(), count: config.count });
    }
    Ok(statistics::aggregate(ip_addr, family, &record))
}

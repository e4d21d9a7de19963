use crate::details::icmp::AddressFamily;
use crate::{PingError, PingResult};
use std::net::IpAddr;

/// Maps a host name or address literal to the address to probe and its family.
///
/// The first address the system resolver returns wins; there are no retries.
pub(crate) fn resolve(host: &str) -> PingResult<(AddressFamily, IpAddr)> {
    if let Ok(ip_addr) = host.parse::<IpAddr>() {
        return Ok((ip_addr.into(), ip_addr));
    }
    let ips: Vec<IpAddr> = dns_lookup::lookup_host(host)
        .map_err(|e| PingError::HostUnreachable { host: host.to_owned(), source: Some(e) })?;
    let ip_addr = ips
        .into_iter()
        .next()
        .ok_or_else(|| PingError::HostUnreachable { host: host.to_owned(), source: None })?;
    tracing::debug!(host, %ip_addr, "resolved host");
    Ok((ip_addr.into(), ip_addr))
}

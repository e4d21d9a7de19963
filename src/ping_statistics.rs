use crate::{AddressFamily, OsFamily, Ttl};
use serde::Serialize;
use std::net::IpAddr;

/// Summary of one probe run. All round-trip times are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PingStatistics {
    pub address: IpAddr,
    pub family: AddressFamily,
    pub sent: u16,
    pub received: u16,
    pub loss_percent: f64,
    pub rtt_min: Option<f64>,
    pub rtt_max: Option<f64>,
    pub rtt_mean: Option<f64>,
    pub rtt_median: Option<f64>,
    /// Sample standard deviation, 0 with fewer than two samples.
    pub rtt_jitter: f64,
    pub rtt_p95: Option<f64>,
    /// Every matched round-trip time, in sequence order.
    pub rtts: Vec<f64>,
    /// TTL of the first reply; IPv6 runs never have one.
    pub ttl: Option<Ttl>,
    pub hops: Option<u8>,
    pub os_guess: Option<OsFamily>,
}

impl PingStatistics {
    pub fn lost(&self) -> u16 {
        self.sent - self.received
    }
}

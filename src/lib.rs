//! ICMP echo probing: sends `count` echo requests to a host over a raw socket, one at a time,
//! and reduces the replies into loss, round-trip statistics and TTL-based heuristics.

#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use details::icmp::{AddressFamily, OsFamily, Ttl};
pub use ping_error::{PingError, PingResult};
pub use ping_statistics::PingStatistics;
pub use probe::{probe, ProbeConfig, MAX_DSCP, MAX_PAYLOAD_SIZE};

mod details;
mod ping_error;
mod ping_statistics;
mod probe;

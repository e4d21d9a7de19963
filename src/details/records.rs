use crate::details::icmp::{SequenceNumber, Ttl};
use std::time::Duration;

/// One matched round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PingSample {
    pub sequence_number: SequenceNumber,
    pub rtt: Duration,
    pub ttl: Option<Ttl>,
}

/// Everything a probe loop collected over a run, in sequence order.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ProbeRecord {
    pub sent: u16,
    pub samples: Vec<PingSample>,
    /// TTL of the first matched reply.
    pub ttl: Option<Ttl>,
}

impl ProbeRecord {
    pub(crate) fn received(&self) -> u16 {
        u16::try_from(self.samples.len()).unwrap_or(u16::MAX)
    }

    pub(crate) fn lost(&self) -> u16 {
        self.sent - self.received()
    }
}

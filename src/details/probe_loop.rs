use crate::details::icmp::codec::{self, ReplyKind};
use crate::details::icmp::{AddressFamily, SequenceNumber, TSocket, Ttl};
use crate::details::records::{PingSample, ProbeRecord};
use crate::{PingError, PingResult};
use socket2::SockAddr;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

const RECV_BUFFER_SIZE: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProbeState {
    Idle,
    Sending(SequenceNumber),
    Listening(SequenceNumber),
    Matched(SequenceNumber),
    TimedOut(SequenceNumber),
    Done,
}

/// Sends one echo request per sequence number and waits for its reply before sending the
/// next one. Send times are kept here rather than trusted from the reply payload.
pub(crate) struct ProbeLoop<'a, S> {
    socket: &'a S,
    family: AddressFamily,
    destination: SockAddr,
    identifier: u16,
    size: usize,
    timeout: Duration,
    interval: Duration,
    state: ProbeState,
    send_times: HashMap<SequenceNumber, Instant>,
}

impl<'a, S> ProbeLoop<'a, S>
where
    S: TSocket,
{
    pub(crate) fn new(
        socket: &'a S,
        ip_addr: IpAddr,
        identifier: u16,
        size: usize,
        timeout: Duration,
        interval: Duration,
    ) -> Self {
        ProbeLoop {
            socket,
            family: ip_addr.into(),
            // ICMP has no ports.
            destination: SocketAddr::new(ip_addr, 0).into(),
            identifier,
            size,
            timeout,
            interval,
            state: ProbeState::Idle,
            send_times: HashMap::new(),
        }
    }

    pub(crate) fn state(&self) -> ProbeState {
        self.state
    }

    /// Probes `count` sequence numbers. A lost packet only counts as loss; any other failure
    /// aborts the whole run.
    pub(crate) fn run(&mut self, count: u16) -> PingResult<ProbeRecord> {
        let mut samples = Vec::new();
        let mut ttl: Option<Ttl> = None;
        for sequence_number in SequenceNumber::range(count) {
            if let Some(sample) = self.probe_one(sequence_number)? {
                tracing::debug!(seq = u16::from(sample.sequence_number), rtt = ?sample.rtt, "round trip recorded");
                if samples.is_empty() {
                    ttl = sample.ttl;
                }
                samples.push(sample);
            }
            if u16::from(sequence_number) < count {
                std::thread::sleep(self.interval);
            }
        }
        self.transition(ProbeState::Done);
        Ok(ProbeRecord { sent: count, samples, ttl })
    }

    fn probe_one(&mut self, sequence_number: SequenceNumber) -> PingResult<Option<PingSample>> {
        self.transition(ProbeState::Sending(sequence_number));
        let package = codec::encode_request(self.family, self.identifier, sequence_number, self.size)?;
        let send_time = Instant::now();
        self.socket.send_to(&package, &self.destination)?;
        self.send_times.insert(sequence_number, send_time);
        tracing::trace!(seq = u16::from(sequence_number), bytes = package.len(), "echo request sent");

        self.transition(ProbeState::Listening(sequence_number));
        let deadline = send_time + self.timeout;
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Some((n, peer)) = self.socket.recv_from(&mut buf, remaining)? else {
                break;
            };
            let receive_time = Instant::now();
            let reply = codec::decode_reply(self.family, &buf[..n])?;
            match reply.classify(self.family, self.identifier, sequence_number) {
                ReplyKind::Match => {
                    let send_time = self.send_times.remove(&sequence_number).unwrap_or(send_time);
                    let rtt = receive_time.saturating_duration_since(send_time);
                    tracing::trace!(
                        seq = u16::from(sequence_number),
                        %peer,
                        ttl = ?reply.ttl,
                        checksum = reply.checksum,
                        embedded_send_time = ?reply.embedded_send_time,
                        "echo reply matched"
                    );
                    self.transition(ProbeState::Matched(sequence_number));
                    return Ok(Some(PingSample { sequence_number, rtt, ttl: reply.ttl }));
                }
                ReplyKind::Unreachable { code } => {
                    let reason = self.family.unreachable_reason(code);
                    tracing::warn!(seq = u16::from(sequence_number), %peer, code, reason, "destination unreachable");
                    return Err(PingError::DestinationUnreachable { code, reason });
                }
                ReplyKind::Foreign => {
                    tracing::debug!(
                        %peer,
                        icmp_type = reply.icmp_type,
                        identifier = reply.identifier,
                        seq = u16::from(reply.sequence_number),
                        "ignoring foreign ICMP message"
                    );
                }
            }
        }

        self.send_times.remove(&sequence_number);
        tracing::debug!(seq = u16::from(sequence_number), timeout = ?self.timeout, "no reply before timeout");
        self.transition(ProbeState::TimedOut(sequence_number));
        Ok(None)
    }

    fn transition(&mut self, state: ProbeState) {
        tracing::trace!(from = ?self.state, to = ?state, "probe state");
        self.state = state;
    }
}

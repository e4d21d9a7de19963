use super::{checksum, AddressFamily, SequenceNumber, Ttl};
use crate::{PingError, PingResult};
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet_packet::icmp::{IcmpCode, IcmpType};
use pnet_packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::ipv6::Ipv6Packet;
use pnet_packet::Packet;
use std::time::{SystemTime, UNIX_EPOCH};

// ICMPv4 and ICMPv6 echo messages share the same 8 byte header layout (type, code, checksum,
// identifier, sequence number), so the pnet echo packet views are used for both families.

pub(crate) const ICMP_HEADER_SIZE: usize = 8;
pub(crate) const TIMESTAMP_SIZE: usize = 8;
pub(crate) const IPV4_HEADER_SIZE: usize = 20;

/// A datagram read from the raw socket, parsed far enough to correlate it with a probe.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reply {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence_number: SequenceNumber,
    /// Only available when the kernel hands us the IPv4 header.
    pub ttl: Option<Ttl>,
    /// Seconds since the UNIX epoch, as written by [`encode_request`].
    pub embedded_send_time: Option<f64>,
    /// The offending datagram quoted by an ICMP error message.
    pub quoted: Option<QuotedDatagram>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum QuotedDatagram {
    EchoRequest { identifier: u16 },
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ReplyKind {
    Match,
    Foreign,
    Unreachable { code: u8 },
}

impl Reply {
    pub(crate) fn classify(&self, family: AddressFamily, identifier: u16, sequence_number: SequenceNumber) -> ReplyKind {
        if self.icmp_type == family.echo_reply_type() {
            if self.identifier == identifier && self.sequence_number == sequence_number {
                ReplyKind::Match
            } else {
                ReplyKind::Foreign
            }
        } else if self.icmp_type == family.destination_unreachable_type() {
            match self.quoted {
                Some(QuotedDatagram::EchoRequest { identifier: quoted }) if quoted != identifier => ReplyKind::Foreign,
                Some(QuotedDatagram::Other) => ReplyKind::Foreign,
                _ => ReplyKind::Unreachable { code: self.code },
            }
        } else {
            ReplyKind::Foreign
        }
    }
}

/// Builds an echo request carrying `size` payload bytes: the send timestamp followed by zeros.
pub(crate) fn encode_request(
    family: AddressFamily,
    identifier: u16,
    sequence_number: SequenceNumber,
    size: usize,
) -> PingResult<Vec<u8>> {
    encode_request_at(family, identifier, sequence_number, size, SystemTime::now())
}

fn encode_request_at(
    family: AddressFamily,
    identifier: u16,
    sequence_number: SequenceNumber,
    size: usize,
    send_time: SystemTime,
) -> PingResult<Vec<u8>> {
    if size < TIMESTAMP_SIZE {
        return Err(PingError::InvalidArgument(format!(
            "payload size {size} is below the minimum of {TIMESTAMP_SIZE} bytes"
        )));
    }
    let timestamp = send_time.duration_since(UNIX_EPOCH).map_or(0.0, |elapsed| elapsed.as_secs_f64());
    let mut payload = vec![0u8; size];
    payload[..TIMESTAMP_SIZE].copy_from_slice(&timestamp.to_ne_bytes());

    let buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + size];
    let mut package = MutableEchoRequestPacket::owned(buf)
        .ok_or_else(|| PingError::PacketError("could not create ICMP package".to_owned()))?;
    package.set_icmp_type(IcmpType::new(family.echo_request_type()));
    package.set_icmp_code(IcmpCode::new(0));
    package.set_identifier(identifier);
    package.set_sequence_number(sequence_number.into());
    package.set_payload(&payload);
    package.set_checksum(0_u16);
    // The kernel computes the ICMPv6 checksum, it depends on the IPv6 pseudo header.
    if family == AddressFamily::V4 {
        let checksum = checksum(package.packet());
        package.set_checksum(checksum);
    }
    Ok(package.packet().to_vec())
}

/// Parses a datagram as delivered by a raw socket of the given family.
pub(crate) fn decode_reply(family: AddressFamily, raw: &[u8]) -> PingResult<Reply> {
    let (icmp, ttl) = if family.has_ip_header() {
        let ipv4_packet = Ipv4Packet::new(raw).ok_or_else(|| {
            PingError::PacketError(format!("datagram of {} bytes is shorter than an IPv4 header", raw.len()))
        })?;
        let header_size = usize::from(ipv4_packet.get_header_length()) * 4;
        if header_size < IPV4_HEADER_SIZE || header_size > raw.len() {
            return Err(PingError::PacketError(format!("invalid IPv4 header length {header_size}")));
        }
        (&raw[header_size..], Some(Ttl(ipv4_packet.get_ttl())))
    } else {
        (raw, None)
    };

    let package = EchoReplyPacket::new(icmp).ok_or_else(|| {
        PingError::PacketError(format!(
            "ICMP message of {} bytes is shorter than the {ICMP_HEADER_SIZE} byte header",
            icmp.len()
        ))
    })?;
    let icmp_type = package.get_icmp_type().0;
    let payload = package.payload();
    let embedded_send_time = payload
        .get(..TIMESTAMP_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .map(f64::from_ne_bytes);
    let quoted = if icmp_type == family.destination_unreachable_type() {
        parse_quoted_datagram(family, payload)
    } else {
        None
    };

    Ok(Reply {
        icmp_type,
        code: package.get_icmp_code().0,
        checksum: package.get_checksum(),
        identifier: package.get_identifier(),
        sequence_number: package.get_sequence_number().into(),
        ttl,
        embedded_send_time,
        quoted,
    })
}

/// ICMP errors quote the IP header and at least 8 bytes of the datagram that triggered them.
/// Returns `None` when the quote is too short to tell whom it belongs to.
fn parse_quoted_datagram(family: AddressFamily, quote: &[u8]) -> Option<QuotedDatagram> {
    let (protocol, header_size): (IpNextHeaderProtocol, usize) = match family {
        AddressFamily::V4 => {
            let ipv4_packet = Ipv4Packet::new(quote)?;
            (ipv4_packet.get_next_level_protocol(), usize::from(ipv4_packet.get_header_length()) * 4)
        }
        AddressFamily::V6 => {
            let ipv6_packet = Ipv6Packet::new(quote)?;
            (ipv6_packet.get_next_header(), Ipv6Packet::minimum_packet_size())
        }
    };
    let expected_protocol = match family {
        AddressFamily::V4 => IpNextHeaderProtocols::Icmp,
        AddressFamily::V6 => IpNextHeaderProtocols::Icmpv6,
    };
    if protocol != expected_protocol {
        return Some(QuotedDatagram::Other);
    }
    let request = EchoRequestPacket::new(quote.get(header_size..)?)?;
    if request.get_icmp_type().0 == family.echo_request_type() {
        Some(QuotedDatagram::EchoRequest { identifier: request.get_identifier() })
    } else {
        Some(QuotedDatagram::Other)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pnet_packet::ipv4::MutableIpv4Packet;
    use pnet_packet::ipv6::MutableIpv6Packet;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::time::Duration;

    /// Wraps an ICMP message into an IPv4 datagram, the way a raw IPv4 socket delivers it.
    pub(crate) fn ipv4_datagram(ttl: u8, icmp: &[u8]) -> Vec<u8> {
        let buf = vec![0u8; IPV4_HEADER_SIZE + icmp.len()];
        let mut package = MutableIpv4Packet::owned(buf).unwrap();
        package.set_version(4);
        package.set_header_length(5);
        package.set_total_length(u16::try_from(IPV4_HEADER_SIZE + icmp.len()).unwrap());
        package.set_ttl(ttl);
        package.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        package.set_source(Ipv4Addr::LOCALHOST);
        package.set_destination(Ipv4Addr::LOCALHOST);
        package.set_payload(icmp);
        package.packet().to_vec()
    }

    pub(crate) fn ipv6_datagram(icmp: &[u8]) -> Vec<u8> {
        let buf = vec![0u8; Ipv6Packet::minimum_packet_size() + icmp.len()];
        let mut package = MutableIpv6Packet::owned(buf).unwrap();
        package.set_version(6);
        package.set_payload_length(u16::try_from(icmp.len()).unwrap());
        package.set_next_header(IpNextHeaderProtocols::Icmpv6);
        package.set_hop_limit(64);
        package.set_source(Ipv6Addr::LOCALHOST);
        package.set_destination(Ipv6Addr::LOCALHOST);
        package.set_payload(icmp);
        package.packet().to_vec()
    }

    /// Turns an encoded echo request into the matching echo reply.
    pub(crate) fn echo_reply_for(family: AddressFamily, request: &[u8]) -> Vec<u8> {
        let mut reply = request.to_vec();
        reply[0] = family.echo_reply_type();
        reply[2..4].copy_from_slice(&[0, 0]);
        if family == AddressFamily::V4 {
            let checksum = checksum(&reply);
            reply[2..4].copy_from_slice(&checksum.to_be_bytes());
        }
        reply
    }

    /// A destination-unreachable message quoting the IP datagram that carried `request`.
    pub(crate) fn destination_unreachable(family: AddressFamily, code: u8, request: &[u8]) -> Vec<u8> {
        let mut message = vec![family.destination_unreachable_type(), code, 0, 0, 0, 0, 0, 0];
        match family {
            AddressFamily::V4 => {
                let quote = ipv4_datagram(64, request);
                message.extend_from_slice(&quote[..IPV4_HEADER_SIZE + ICMP_HEADER_SIZE]);
            }
            AddressFamily::V6 => message.extend_from_slice(&ipv6_datagram(request)),
        }
        message
    }

    #[test]
    fn size_below_timestamp_is_invalid() {
        let result = encode_request(AddressFamily::V4, 1, SequenceNumber::start_value(), 4);
        assert!(matches!(result, Err(PingError::InvalidArgument(_))));
    }

    #[test]
    fn request_layout() {
        let request = encode_request(AddressFamily::V4, 0xABCD, SequenceNumber::from(7), 56).unwrap();
        assert_eq!(ICMP_HEADER_SIZE + 56, request.len());
        assert_eq!(8, request[0]);
        assert_eq!(0, request[1]);
        assert_eq!([0xAB, 0xCD], request[4..6]);
        assert_eq!([0x00, 0x07], request[6..8]);
        assert!(request[ICMP_HEADER_SIZE + TIMESTAMP_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn ipv4_request_checksum_validates() {
        let request = encode_request(AddressFamily::V4, 0x1234, SequenceNumber::from(3), 33).unwrap();
        assert_ne!([0, 0], request[2..4]);
        assert_eq!(0, checksum(&request));
    }

    #[test]
    fn ipv6_request_leaves_checksum_to_kernel() {
        let request = encode_request(AddressFamily::V6, 0x1234, SequenceNumber::from(3), 8).unwrap();
        assert_eq!(128, request[0]);
        assert_eq!([0, 0], request[2..4]);
    }

    #[test]
    fn decode_ipv4_round_trip() {
        let send_time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        let request =
            encode_request_at(AddressFamily::V4, 0xBEEF, SequenceNumber::from(42), 16, send_time).unwrap();
        let raw = ipv4_datagram(57, &echo_reply_for(AddressFamily::V4, &request));

        let reply = decode_reply(AddressFamily::V4, &raw).unwrap();

        assert_eq!(0, reply.icmp_type);
        assert_eq!(0xBEEF, reply.identifier);
        assert_eq!(SequenceNumber::from(42), reply.sequence_number);
        assert_eq!(Some(Ttl(57)), reply.ttl);
        assert_eq!(Some(1_700_000_000.25), reply.embedded_send_time);
        assert_eq!(None, reply.quoted);
    }

    #[test]
    fn decode_ipv6_has_no_ttl() {
        let request = encode_request(AddressFamily::V6, 0xBEEF, SequenceNumber::from(2), 8).unwrap();
        let reply = decode_reply(AddressFamily::V6, &echo_reply_for(AddressFamily::V6, &request)).unwrap();

        assert_eq!(129, reply.icmp_type);
        assert_eq!(0xBEEF, reply.identifier);
        assert_eq!(SequenceNumber::from(2), reply.sequence_number);
        assert_eq!(None, reply.ttl);
        assert!(reply.embedded_send_time.is_some());
    }

    #[test]
    fn decode_without_timestamp() {
        let raw = ipv4_datagram(64, &[0, 0, 0, 0, 0, 1, 0, 1]);
        let reply = decode_reply(AddressFamily::V4, &raw).unwrap();
        assert_eq!(None, reply.embedded_send_time);
    }

    #[test]
    fn decode_short_buffers_fail() {
        assert!(matches!(decode_reply(AddressFamily::V4, &[0u8; 12]), Err(PingError::PacketError(_))));
        assert!(matches!(decode_reply(AddressFamily::V4, &[0x45; 24]), Err(PingError::PacketError(_))));
        assert!(matches!(decode_reply(AddressFamily::V6, &[129, 0, 0]), Err(PingError::PacketError(_))));
    }

    #[test]
    fn decode_rejects_bad_ipv4_header_length() {
        let mut raw = ipv4_datagram(64, &[0u8; 8]);
        raw[0] = 0x44;
        assert!(matches!(decode_reply(AddressFamily::V4, &raw), Err(PingError::PacketError(_))));
    }

    #[test]
    fn classify_echo_replies() {
        let request = encode_request(AddressFamily::V4, 100, SequenceNumber::from(5), 8).unwrap();
        let raw = ipv4_datagram(64, &echo_reply_for(AddressFamily::V4, &request));
        let reply = decode_reply(AddressFamily::V4, &raw).unwrap();

        assert_eq!(ReplyKind::Match, reply.classify(AddressFamily::V4, 100, SequenceNumber::from(5)));
        assert_eq!(ReplyKind::Foreign, reply.classify(AddressFamily::V4, 101, SequenceNumber::from(5)));
        assert_eq!(ReplyKind::Foreign, reply.classify(AddressFamily::V4, 100, SequenceNumber::from(6)));
    }

    #[test]
    fn own_echo_request_is_foreign() {
        let request = encode_request(AddressFamily::V4, 100, SequenceNumber::from(5), 8).unwrap();
        let reply = decode_reply(AddressFamily::V4, &ipv4_datagram(64, &request)).unwrap();
        assert_eq!(ReplyKind::Foreign, reply.classify(AddressFamily::V4, 100, SequenceNumber::from(5)));
    }

    #[test]
    fn classify_destination_unreachable() {
        for family in [AddressFamily::V4, AddressFamily::V6] {
            let request = encode_request(family, 100, SequenceNumber::from(1), 8).unwrap();
            let mut raw = destination_unreachable(family, 3, &request);
            if family == AddressFamily::V4 {
                raw = ipv4_datagram(64, &raw);
            }
            let reply = decode_reply(family, &raw).unwrap();

            assert_eq!(Some(QuotedDatagram::EchoRequest { identifier: 100 }), reply.quoted);
            assert_eq!(ReplyKind::Unreachable { code: 3 }, reply.classify(family, 100, SequenceNumber::from(1)));
            assert_eq!(ReplyKind::Foreign, reply.classify(family, 200, SequenceNumber::from(1)));
        }
    }

    #[test]
    fn unreachable_without_quote_is_attributed_to_us() {
        let raw = ipv4_datagram(64, &[3, 1, 0, 0, 0, 0, 0, 0]);
        let reply = decode_reply(AddressFamily::V4, &raw).unwrap();
        assert_eq!(None, reply.quoted);
        assert_eq!(ReplyKind::Unreachable { code: 1 }, reply.classify(AddressFamily::V4, 9, SequenceNumber::from(1)));
    }

    #[test]
    fn unreachable_quoting_other_protocol_is_foreign() {
        let mut quote = ipv4_datagram(64, &[0u8; 8]);
        quote[9] = IpNextHeaderProtocols::Udp.0;
        let mut message = vec![3, 3, 0, 0, 0, 0, 0, 0];
        message.extend_from_slice(&quote);
        let reply = decode_reply(AddressFamily::V4, &ipv4_datagram(64, &message)).unwrap();
        assert_eq!(Some(QuotedDatagram::Other), reply.quoted);
        assert_eq!(ReplyKind::Foreign, reply.classify(AddressFamily::V4, 9, SequenceNumber::from(1)));
    }
}

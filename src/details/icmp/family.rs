use pnet_packet::icmp::IcmpTypes;
use pnet_packet::icmpv6::Icmpv6Types;
use serde::Serialize;
use socket2::{Domain, Protocol};
use std::fmt;
use std::net::IpAddr;

/// The IP version a probe run talks, selected once from the resolved address.
///
/// Everything that differs between ICMPv4 and ICMPv6 (message types, socket domain, the
/// presence of an IP header on received datagrams and the destination-unreachable reasons)
/// hangs off this type.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl AddressFamily {
    pub(crate) fn echo_request_type(self) -> u8 {
        match self {
            AddressFamily::V4 => IcmpTypes::EchoRequest.0,
            AddressFamily::V6 => Icmpv6Types::EchoRequest.0,
        }
    }

    pub(crate) fn echo_reply_type(self) -> u8 {
        match self {
            AddressFamily::V4 => IcmpTypes::EchoReply.0,
            AddressFamily::V6 => Icmpv6Types::EchoReply.0,
        }
    }

    pub(crate) fn destination_unreachable_type(self) -> u8 {
        match self {
            AddressFamily::V4 => IcmpTypes::DestinationUnreachable.0,
            AddressFamily::V6 => Icmpv6Types::DestinationUnreachable.0,
        }
    }

    /// Raw IPv4 sockets hand us the IP header, raw IPv6 sockets do not.
    pub(crate) fn has_ip_header(self) -> bool {
        matches!(self, AddressFamily::V4)
    }

    pub(crate) fn domain(self) -> Domain {
        match self {
            AddressFamily::V4 => Domain::IPV4,
            AddressFamily::V6 => Domain::IPV6,
        }
    }

    pub(crate) fn protocol(self) -> Protocol {
        match self {
            AddressFamily::V4 => Protocol::ICMPV4,
            AddressFamily::V6 => Protocol::ICMPV6,
        }
    }

    /// Human-readable reason for a destination-unreachable code (RFC 792 / RFC 4443).
    pub(crate) fn unreachable_reason(self, code: u8) -> &'static str {
        match self {
            AddressFamily::V4 => match code {
                0 => "Net unreachable",
                1 => "Host unreachable",
                2 => "Protocol unreachable",
                3 => "Port unreachable",
                4 => "Fragmentation needed and DF set",
                5 => "Source route failed",
                6 => "Destination network unknown",
                7 => "Destination host unknown",
                8 => "Source host isolated",
                9 => "Network administratively prohibited",
                10 => "Host administratively prohibited",
                11 => "Network unreachable for TOS",
                12 => "Host unreachable for TOS",
                13 => "Communication administratively prohibited",
                14 => "Host precedence violation",
                15 => "Precedence cutoff in effect",
                _ => "Unknown code",
            },
            AddressFamily::V6 => match code {
                0 => "No route to destination",
                1 => "Communication with destination administratively prohibited",
                2 => "Beyond scope of source address",
                3 => "Address unreachable",
                4 => "Port unreachable",
                5 => "Source address failed ingress/egress policy",
                6 => "Reject route to destination",
                7 => "Error in Source Routing Header",
                _ => "Unknown code",
            },
        }
    }
}

impl From<IpAddr> for AddressFamily {
    fn from(ip_addr: IpAddr) -> Self {
        match ip_addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

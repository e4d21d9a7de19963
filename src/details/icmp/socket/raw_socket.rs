use super::TSocket;
use crate::details::icmp::AddressFamily;
use crate::{PingError, PingResult};
use socket2::{SockAddr, Type};
use std::io;
use std::mem::MaybeUninit;
use std::net::IpAddr;
use std::time::{Duration, Instant};

// SO_RCVTIMEO has microsecond resolution and a zero timeval means "block forever".
const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

/// A raw ICMP or ICMPv6 socket. Dropping it closes the descriptor.
pub(crate) struct RawSocket {
    socket: socket2::Socket,
    family: AddressFamily,
}

impl RawSocket {
    pub(crate) fn open(family: AddressFamily) -> PingResult<Self> {
        tracing::trace!(%family, "opening raw socket");
        let socket = socket2::Socket::new(family.domain(), Type::RAW, Some(family.protocol())).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                PingError::PermissionDenied(e)
            } else {
                PingError::TransportError(e)
            }
        })?;
        Ok(RawSocket { socket, family })
    }

    /// Tags outgoing packets with a DSCP value (0-63) in the TOS / traffic-class byte.
    pub(crate) fn set_traffic_class(&self, dscp: u8) -> PingResult<()> {
        let traffic_class = u32::from(dscp) << 2;
        tracing::trace!(dscp, traffic_class, "setting traffic class");
        match self.family {
            AddressFamily::V4 => self.socket.set_tos(traffic_class)?,
            AddressFamily::V6 => self.socket.set_tclass_v6(traffic_class)?,
        }
        Ok(())
    }

    pub(crate) fn close(self) {
        drop(self);
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        tracing::trace!(family = %self.family, "closing raw socket");
    }
}

impl TSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<(usize, IpAddr)>> {
        let deadline = Instant::now() + timeout;

        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`: it never writes uninitialized bytes into the buffer.
        // https://docs.rs/socket2/0.5/socket2/struct.Socket.html#method.recv
        let uninit_buf = unsafe { &mut *(std::ptr::addr_of_mut!(*buf) as *mut [MaybeUninit<u8>]) };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            self.socket.set_read_timeout(Some(remaining.max(MIN_READ_TIMEOUT)))?;
            match self.socket.recv_from(uninit_buf) {
                Ok((n, socket_addr)) => {
                    let ip_addr = socket_addr
                        .as_socket()
                        .map(|addr| addr.ip())
                        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "received from a non-IP address"))?;
                    return Ok(Some((n, ip_addr)));
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => return Ok(None),
                // Interrupted: try again with whatever time is left.
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

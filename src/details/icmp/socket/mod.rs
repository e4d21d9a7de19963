use std::io;
use std::net::IpAddr;
use std::time::Duration;

pub(crate) mod raw_socket;

pub(crate) trait TSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    /// Waits at most `timeout` for one datagram. `Ok(None)` means nothing arrived in time.
    fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<(usize, IpAddr)>>;
}

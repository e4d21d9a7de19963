mod checksum;
pub(crate) mod codec;
mod family;
mod sequence_number;
pub(crate) mod socket;
mod ttl;

pub(crate) use checksum::checksum;
pub use family::AddressFamily;
pub(crate) use sequence_number::SequenceNumber;
pub(crate) use socket::raw_socket::RawSocket;
pub(crate) use socket::TSocket;
pub use ttl::{OsFamily, Ttl};

pub(crate) mod icmp;
pub(crate) mod probe_loop;
pub(crate) mod records;
pub(crate) mod resolver;
pub(crate) mod statistics;

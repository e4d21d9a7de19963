use serde::Serialize;

type TtlInnerType = u8;

/// Time-to-live observed on a received IPv4 datagram.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Ttl(pub TtlInnerType);

/// Operating-system family guessed from the initial TTL a peer's stack uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum OsFamily {
    #[serde(rename = "Linux/Unix/BSD/macOS/Android")]
    Unix,
    #[serde(rename = "Windows")]
    Windows,
    #[serde(rename = "Network device (e.g., Cisco)")]
    NetworkDevice,
}

impl Ttl {
    /// Rounds the observed TTL up to the closest common initial value: 64, 128 or 255.
    pub fn initial_guess(self) -> TtlInnerType {
        match self.0 {
            0..=64 => 64,
            65..=128 => 128,
            _ => 255,
        }
    }

    /// Heuristic hop count, counting the peer itself as one hop.
    pub fn hops(self) -> TtlInnerType {
        self.initial_guess() - self.0 + 1
    }

    pub fn os_guess(self) -> OsFamily {
        match self.initial_guess() {
            64 => OsFamily::Unix,
            128 => OsFamily::Windows,
            _ => OsFamily::NetworkDevice,
        }
    }
}

impl From<TtlInnerType> for Ttl {
    fn from(integer: TtlInnerType) -> Self {
        Ttl(integer)
    }
}

impl From<Ttl> for TtlInnerType {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OsFamily::Unix => "Linux/Unix/BSD/macOS/Android",
            OsFamily::Windows => "Windows",
            OsFamily::NetworkDevice => "Network device (e.g., Cisco)",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt() {
        assert_eq!("8", format!("{}", Ttl(8)));
        assert_eq!("Windows", format!("{}", OsFamily::Windows));
    }

    #[test]
    fn initial_guess_buckets() {
        assert_eq!(64, Ttl(1).initial_guess());
        assert_eq!(64, Ttl(64).initial_guess());
        assert_eq!(128, Ttl(65).initial_guess());
        assert_eq!(128, Ttl(128).initial_guess());
        assert_eq!(255, Ttl(129).initial_guess());
        assert_eq!(255, Ttl(255).initial_guess());
    }

    #[test]
    fn hops() {
        assert_eq!(1, Ttl(64).hops());
        assert_eq!(9, Ttl(56).hops());
        assert_eq!(11, Ttl(118).hops());
        assert_eq!(1, Ttl(255).hops());
        assert_eq!(65, Ttl(0).hops());
    }

    #[test]
    fn os_guess() {
        assert_eq!(OsFamily::Unix, Ttl(57).os_guess());
        assert_eq!(OsFamily::Windows, Ttl(113).os_guess());
        assert_eq!(OsFamily::NetworkDevice, Ttl(240).os_guess());
    }
}

//! Monitored login server targets.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use super::ResponseEncoding;
use crate::utils::hex;

/// A login server whose replies we listen for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Display name (e.g., "Taiwan")
    pub name: String,
    /// Login server address
    pub address: Ipv4Addr,
    /// Login server port
    pub port: u16,
    /// Byte pattern marking the start of the server list in a reply
    pub signature: Vec<u8>,
    /// How the reply encodes population
    pub encoding: ResponseEncoding,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        address: Ipv4Addr,
        port: u16,
        signature: impl Into<Vec<u8>>,
        encoding: ResponseEncoding,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            port,
            signature: signature.into(),
            encoding,
        }
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }

    /// The capture filter for this target, in BPF syntax.
    ///
    /// Matches both directions; the session narrows it to replies.
    pub fn filter_expression(&self) -> String {
        format!("tcp and net {} and port {}", self.address, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, signature {}, {})",
            self.name,
            self.socket_addr(),
            hex::encode(&self.signature),
            self.encoding
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taiwan() -> Target {
        Target::new(
            "Taiwan",
            Ipv4Addr::new(219, 84, 200, 54),
            6900,
            vec![0xc0, 0xa8],
            ResponseEncoding::Count,
        )
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(
            taiwan().filter_expression(),
            "tcp and net 219.84.200.54 and port 6900"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            taiwan().to_string(),
            "Taiwan (219.84.200.54:6900, signature c0a8, count)"
        );
    }
}

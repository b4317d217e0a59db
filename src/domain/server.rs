//! Sub-server (character server) domain models.

use std::fmt;
use std::net::SocketAddrV4;

/// How a login server reports population in its server list reply.
///
/// Each variant selects its own record layout in the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEncoding {
    /// The users field is a literal player count
    Count,
    /// The users field is a coded status level
    Status,
}

impl ResponseEncoding {
    /// Parse from the configuration name (`count` or `status`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "count" | "number" | "numeric" => Some(Self::Count),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// Interpret a raw users field under this encoding.
    pub fn population(&self, raw: u16) -> Population {
        match self {
            Self::Count => Population::Count(raw),
            Self::Status => Population::Status(ServerStatus::from_code(raw)),
        }
    }
}

impl fmt::Display for ResponseEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Status => write!(f, "status"),
        }
    }
}

/// Qualitative population level reported by status-coded servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Comfortable,
    Crowded,
    Full,
    Unknown(u16),
}

impl ServerStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Comfortable,
            2 => Self::Crowded,
            3 => Self::Full,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comfortable => write!(f, "comfortable"),
            Self::Crowded => write!(f, "crowded"),
            Self::Full => write!(f, "full"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

/// Population of a sub-server, as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Count(u16),
    Status(ServerStatus),
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(players) => write!(f, "{players}"),
            Self::Status(status) => write!(f, "{status}"),
        }
    }
}

/// One entry of a login server's sub-server list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubServer {
    pub name: String,
    pub address: SocketAddrV4,
    pub population: Population,
    /// Server state flag (maintenance etc.)
    pub state: u16,
    /// Server property flag (new, PvP etc.)
    pub property: u16,
}

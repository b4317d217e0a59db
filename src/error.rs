use thiserror::Error;

/// Errors raised while opening or reading a capture interface.
///
/// These are always scoped to a single interface: the session logs them and
/// keeps capturing on the others.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("Unsupported link type on interface {0}")]
    UnsupportedLinkType(String),

    #[error("Insufficient permissions to capture (try running as root)")]
    InsufficientPermissions,

    #[error("Capture device not opened: {0}")]
    NotOpened(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid target line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    #[error("Invalid address '{0}': expected ip:port")]
    InvalidAddress(String),

    #[error("Invalid signature '{0}': expected an even number of hex digits")]
    InvalidSignature(String),

    #[error("Invalid encoding '{0}': expected 'count' or 'status'")]
    InvalidEncoding(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("No target named '{0}'")]
    UnknownTarget(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Reasons a candidate payload is not a server list reply.
///
/// Every variant means "no match": a decode never yields partial records.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty signature")]
    EmptySignature,

    #[error("Signature not found")]
    SignatureNotFound,

    #[error("No records after signature at offset {offset}")]
    NoRecords { offset: usize },

    #[error("Record data truncated: {len} bytes is not a multiple of {record_size}")]
    Truncated { len: usize, record_size: usize },

    #[error("Invalid record {index}: {message}")]
    InvalidRecord { index: usize, message: String },
}

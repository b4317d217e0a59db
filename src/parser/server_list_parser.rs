//! Server list reply parser.
//!
//! A login server reply carries, somewhere after a short server-specific
//! signature, a run of fixed-width sub-server records. Multi-byte integers
//! are little-endian as on the game wire.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::domain::{ResponseEncoding, SubServer, Target};
use crate::error::DecodeError;

/// Width of the NUL-padded server name field
const NAME_LEN: usize = 20;

/// Field offsets shared by every record layout
mod offsets {
    pub const IP: usize = 0;
    pub const PORT: usize = 4;
    pub const NAME: usize = 6;
    pub const USERS: usize = 26;
    pub const STATE: usize = 28;
    pub const PROPERTY: usize = 30;
}

/// Fixed-width record layout for one reply encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub record_size: usize,
}

impl RecordLayout {
    /// Classic 32-byte record with a literal player count.
    pub const COUNT: Self = Self { record_size: 32 };
    /// 160-byte record with a status code and 128 reserved bytes.
    pub const STATUS: Self = Self { record_size: 160 };

    pub fn for_encoding(encoding: ResponseEncoding) -> Self {
        match encoding {
            ResponseEncoding::Count => Self::COUNT,
            ResponseEncoding::Status => Self::STATUS,
        }
    }
}

/// Decoder for server list replies of one target.
///
/// Decoding is a pure function of the buffer: the same input always
/// yields the same result.
#[derive(Debug, Clone)]
pub struct ServerListParser {
    signature: Vec<u8>,
    encoding: ResponseEncoding,
    layout: RecordLayout,
}

impl ServerListParser {
    pub fn new(signature: impl Into<Vec<u8>>, encoding: ResponseEncoding) -> Self {
        Self {
            signature: signature.into(),
            encoding,
            layout: RecordLayout::for_encoding(encoding),
        }
    }

    pub fn for_target(target: &Target) -> Self {
        Self::new(target.signature.clone(), target.encoding)
    }

    /// Decode the sub-server list from one candidate payload.
    ///
    /// Every occurrence of the signature is tried left to right; the first
    /// one followed by a well-formed record run wins. If none does, the
    /// error of the first occurrence is returned.
    pub fn parse(&self, data: &[u8]) -> Result<Vec<SubServer>, DecodeError> {
        if self.signature.is_empty() {
            return Err(DecodeError::EmptySignature);
        }

        let mut first_error = None;

        for offset in self.signature_offsets(data) {
            let start = offset + self.signature.len();
            match self.parse_records(&data[start..], start) {
                Ok(servers) => return Ok(servers),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(first_error.unwrap_or(DecodeError::SignatureNotFound))
    }

    fn signature_offsets<'a>(&'a self, data: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        data.windows(self.signature.len())
            .enumerate()
            .filter(move |(_, window)| *window == self.signature.as_slice())
            .map(|(offset, _)| offset)
    }

    fn parse_records(&self, data: &[u8], offset: usize) -> Result<Vec<SubServer>, DecodeError> {
        let record_size = self.layout.record_size;

        if data.is_empty() {
            return Err(DecodeError::NoRecords { offset });
        }

        if data.len() % record_size != 0 {
            return Err(DecodeError::Truncated {
                len: data.len(),
                record_size,
            });
        }

        data.chunks_exact(record_size)
            .enumerate()
            .map(|(index, record)| self.parse_record(index, record))
            .collect()
    }

    fn parse_record(&self, index: usize, record: &[u8]) -> Result<SubServer, DecodeError> {
        let ip = Ipv4Addr::new(
            record[offsets::IP],
            record[offsets::IP + 1],
            record[offsets::IP + 2],
            record[offsets::IP + 3],
        );
        let port = read_u16_le(record, offsets::PORT);

        let name = parse_name(&record[offsets::NAME..offsets::NAME + NAME_LEN]).ok_or_else(|| {
            DecodeError::InvalidRecord {
                index,
                message: "empty server name".to_string(),
            }
        })?;

        let users = read_u16_le(record, offsets::USERS);

        Ok(SubServer {
            name,
            address: SocketAddrV4::new(ip, port),
            population: self.encoding.population(users),
            state: read_u16_le(record, offsets::STATE),
            property: read_u16_le(record, offsets::PROPERTY),
        })
    }
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Parse a NUL-terminated name, returning None if it is blank.
fn parse_name(data: &[u8]) -> Option<String> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let name = String::from_utf8_lossy(&data[..end]).trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

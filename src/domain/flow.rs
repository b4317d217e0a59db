//! Flow domain models.
//!
//! A flow is one direction of a TCP conversation, identified by its 4-tuple.
//! Only the direction originating from the target server is ever tracked.

use std::cmp::Reverse;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Instant;

/// One captured TCP payload, owned independently of the capture buffer.
pub type Payload = Vec<u8>;

/// Identifies a direction-specific TCP conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
}

impl FlowKey {
    pub fn new(src_ip: Ipv4Addr, src_port: u16, dst_ip: Ipv4Addr, dst_port: u16) -> Self {
        Self {
            src_ip,
            dst_ip,
            src_port,
            dst_port,
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port
        )
    }
}

/// A TCP segment that passed the target direction check.
///
/// Produced by the interface capture loops and consumed by the session
/// coordinator, which owns the flow table.
#[derive(Debug, Clone)]
pub struct TcpSegment {
    pub key: FlowKey,
    /// Copy of the TCP payload (may be empty for pure ACKs)
    pub payload: Payload,
    /// FIN or RST was set
    pub closing: bool,
}

/// Aggregated state of one observed flow.
#[derive(Debug, Clone)]
pub struct FlowRecord {
    pub key: FlowKey,
    /// When the first segment of this flow was seen
    pub started_at: Instant,
    /// When the latest segment of this flow was seen
    pub last_seen: Instant,
    /// Payload chunks in capture order (not TCP sequence order)
    pub chunks: Vec<Payload>,
    /// A FIN or RST was observed
    pub finished: bool,
}

impl FlowRecord {
    pub fn new(key: FlowKey) -> Self {
        Self::started_at(key, Instant::now())
    }

    pub fn started_at(key: FlowKey, now: Instant) -> Self {
        Self {
            key,
            started_at: now,
            last_seen: now,
            chunks: Vec::new(),
            finished: false,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Append a payload chunk. Empty payloads are not recorded.
    pub fn push_payload(&mut self, payload: &[u8]) {
        if payload.is_empty() {
            return;
        }
        self.chunks.push(payload.to_vec());
    }

    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    pub fn has_payload(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// Total number of payload bytes captured on this flow.
    pub fn payload_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Payload chunks ordered longest first.
    ///
    /// The sort is stable: chunks of equal length keep their capture order.
    pub fn chunks_by_length_desc(&self) -> Vec<&[u8]> {
        let mut sorted: Vec<&[u8]> = self.chunks.iter().map(Vec::as_slice).collect();
        sorted.sort_by_key(|chunk| Reverse(chunk.len()));
        sorted
    }
}

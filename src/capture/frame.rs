//! Frame classification: link, network and transport header decoding.

use std::net::Ipv4Addr;

use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::{TcpFlags, TcpPacket};
use pnet::packet::vlan::VlanPacket;
use pnet::packet::Packet;

use crate::domain::{FlowKey, TcpSegment, Target};

/// Traffic filter for one target's replies.
///
/// pnet has no kernel filter, so the capture loop applies this to every
/// frame before any flow state is touched. Only segments sent from the
/// target address and port pass: the request direction is never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficFilter {
    address: Ipv4Addr,
    port: u16,
}

impl TrafficFilter {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address, port }
    }

    pub fn for_target(target: &Target) -> Self {
        Self::new(target.address, target.port)
    }

    /// True if the segment was sent by the target server.
    pub fn is_from_target(&self, src: Ipv4Addr, src_port: u16) -> bool {
        src == self.address && src_port == self.port
    }
}

/// Decode an Ethernet frame into a segment sent by the target.
///
/// Returns None for anything else: non-IPv4, non-TCP, malformed headers,
/// non-first fragments, or traffic in the other direction.
pub fn classify_frame(frame: &[u8], filter: &TrafficFilter) -> Option<TcpSegment> {
    let ethernet = EthernetPacket::new(frame)?;

    match ethernet.get_ethertype() {
        EtherTypes::Ipv4 => classify_ipv4(ethernet.payload(), filter),
        EtherTypes::Vlan => {
            let vlan = VlanPacket::new(ethernet.payload())?;
            if vlan.get_ethertype() != EtherTypes::Ipv4 {
                return None;
            }
            classify_ipv4(vlan.payload(), filter)
        }
        _ => None,
    }
}

fn classify_ipv4(data: &[u8], filter: &TrafficFilter) -> Option<TcpSegment> {
    let ipv4 = Ipv4Packet::new(data)?;

    if ipv4.get_header_length() < 5 || ipv4.get_fragment_offset() != 0 {
        return None;
    }

    if ipv4.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return None;
    }

    let tcp_bytes = ipv4.payload();
    let tcp = TcpPacket::new(tcp_bytes)?;

    let data_offset = tcp.get_data_offset() as usize * 4;
    if data_offset < TcpPacket::minimum_packet_size() || data_offset > tcp_bytes.len() {
        return None;
    }

    let src = ipv4.get_source();
    let dst = ipv4.get_destination();
    let src_port = tcp.get_source();
    let dst_port = tcp.get_destination();

    if !filter.is_from_target(src, src_port) {
        return None;
    }

    let flags = tcp.get_flags();

    Some(TcpSegment {
        key: FlowKey::new(src, src_port, dst, dst_port),
        payload: tcp.payload().to_vec(),
        closing: flags & (TcpFlags::FIN | TcpFlags::RST) != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::testing::{build_frame, FrameSpec};

    const SERVER: Ipv4Addr = Ipv4Addr::new(219, 84, 200, 54);
    const CLIENT: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);

    fn filter() -> TrafficFilter {
        TrafficFilter::new(SERVER, 6900)
    }

    #[test]
    fn test_reply_from_target_accepted() {
        let frame = build_frame(&FrameSpec::reply(SERVER, 6900, CLIENT, 51000, b"hello"));

        let segment = classify_frame(&frame, &filter()).unwrap();
        assert_eq!(segment.key, FlowKey::new(SERVER, 6900, CLIENT, 51000));
        assert_eq!(segment.payload, b"hello");
        assert!(!segment.closing);
    }

    #[test]
    fn test_request_to_target_ignored() {
        let frame = build_frame(&FrameSpec::reply(CLIENT, 51000, SERVER, 6900, b"login"));
        assert!(classify_frame(&frame, &filter()).is_none());
    }

    #[test]
    fn test_wrong_port_ignored() {
        let frame = build_frame(&FrameSpec::reply(SERVER, 6901, CLIENT, 51000, b"x"));
        assert!(classify_frame(&frame, &filter()).is_none());

        // Right port, wrong host
        let other = Ipv4Addr::new(8, 8, 8, 8);
        let frame = build_frame(&FrameSpec::reply(other, 6900, CLIENT, 51000, b"x"));
        assert!(classify_frame(&frame, &filter()).is_none());
    }

    #[test]
    fn test_fin_and_rst_mark_closing() {
        let mut spec = FrameSpec::reply(SERVER, 6900, CLIENT, 51000, b"");
        spec.flags = TcpFlags::FIN | TcpFlags::ACK;
        assert!(classify_frame(&build_frame(&spec), &filter()).unwrap().closing);

        spec.flags = TcpFlags::RST;
        assert!(classify_frame(&build_frame(&spec), &filter()).unwrap().closing);

        spec.flags = TcpFlags::ACK;
        assert!(!classify_frame(&build_frame(&spec), &filter()).unwrap().closing);
    }

    #[test]
    fn test_padded_ack_has_empty_payload() {
        // Short frames are padded to the Ethernet minimum; padding is not payload
        let mut frame = build_frame(&FrameSpec::reply(SERVER, 6900, CLIENT, 51000, b""));
        frame.resize(60, 0);

        let segment = classify_frame(&frame, &filter()).unwrap();
        assert!(segment.payload.is_empty());
    }

    #[test]
    fn test_non_tcp_ignored() {
        let mut spec = FrameSpec::reply(SERVER, 6900, CLIENT, 51000, b"x");
        spec.protocol = IpNextHeaderProtocols::Udp;
        assert!(classify_frame(&build_frame(&spec), &filter()).is_none());
    }

    #[test]
    fn test_non_ipv4_ignored() {
        let mut frame = build_frame(&FrameSpec::reply(SERVER, 6900, CLIENT, 51000, b"x"));
        // EtherType IPv6
        frame[12] = 0x86;
        frame[13] = 0xdd;
        assert!(classify_frame(&frame, &filter()).is_none());
    }

    #[test]
    fn test_malformed_frames_ignored() {
        assert!(classify_frame(&[], &filter()).is_none());
        assert!(classify_frame(&[0u8; 10], &filter()).is_none());

        let frame = build_frame(&FrameSpec::reply(SERVER, 6900, CLIENT, 51000, b"x"));
        // Cut inside the TCP header
        assert!(classify_frame(&frame[..40], &filter()).is_none());
    }

    #[test]
    fn test_filter_accepts_only_target_endpoint() {
        let filter = filter();
        assert!(filter.is_from_target(SERVER, 6900));
        assert!(!filter.is_from_target(CLIENT, 51000));
        assert!(!filter.is_from_target(SERVER, 51000));
        assert!(!filter.is_from_target(CLIENT, 6900));
    }
}

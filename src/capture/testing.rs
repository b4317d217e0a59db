//! In-memory capture backend and frame builders for tests.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pnet::packet::ethernet::{EtherTypes, MutableEthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::MutableIpv4Packet;
use pnet::packet::tcp::{MutableTcpPacket, TcpFlags};
use pnet::util::MacAddr;

use super::{InterfaceProvider, PacketCapture};
use crate::error::CaptureError;

const ETHERNET_HEADER_LEN: usize = 14;
const IPV4_HEADER_LEN: usize = 20;
const TCP_HEADER_LEN: usize = 20;

/// Header fields of a synthetic Ethernet/IPv4/TCP frame.
#[derive(Debug, Clone)]
pub(crate) struct FrameSpec {
    pub src: Ipv4Addr,
    pub src_port: u16,
    pub dst: Ipv4Addr,
    pub dst_port: u16,
    pub flags: u8,
    pub protocol: IpNextHeaderProtocol,
    pub payload: Vec<u8>,
}

impl FrameSpec {
    pub fn reply(src: Ipv4Addr, src_port: u16, dst: Ipv4Addr, dst_port: u16, payload: &[u8]) -> Self {
        Self {
            src,
            src_port,
            dst,
            dst_port,
            flags: TcpFlags::ACK | TcpFlags::PSH,
            protocol: IpNextHeaderProtocols::Tcp,
            payload: payload.to_vec(),
        }
    }

    pub fn closing(mut self) -> Self {
        self.flags |= TcpFlags::FIN;
        self
    }
}

pub(crate) fn build_frame(spec: &FrameSpec) -> Vec<u8> {
    let tcp_len = TCP_HEADER_LEN + spec.payload.len();
    let ip_len = IPV4_HEADER_LEN + tcp_len;
    let mut buf = vec![0u8; ETHERNET_HEADER_LEN + ip_len];

    {
        let mut ethernet = MutableEthernetPacket::new(&mut buf).unwrap();
        ethernet.set_destination(MacAddr::new(0x02, 0, 0, 0, 0, 0x02));
        ethernet.set_source(MacAddr::new(0x02, 0, 0, 0, 0, 0x01));
        ethernet.set_ethertype(EtherTypes::Ipv4);
    }
    {
        let mut ipv4 = MutableIpv4Packet::new(&mut buf[ETHERNET_HEADER_LEN..]).unwrap();
        ipv4.set_version(4);
        ipv4.set_header_length(5);
        ipv4.set_total_length(ip_len as u16);
        ipv4.set_ttl(64);
        ipv4.set_next_level_protocol(spec.protocol);
        ipv4.set_source(spec.src);
        ipv4.set_destination(spec.dst);
    }
    {
        let mut tcp =
            MutableTcpPacket::new(&mut buf[ETHERNET_HEADER_LEN + IPV4_HEADER_LEN..]).unwrap();
        tcp.set_source(spec.src_port);
        tcp.set_destination(spec.dst_port);
        tcp.set_data_offset(5);
        tcp.set_flags(spec.flags);
        tcp.set_window(65535);
        tcp.set_payload(&spec.payload);
    }

    buf
}

/// Open/release counters shared by every capture of a test.
#[derive(Debug, Default)]
pub(crate) struct CaptureStats {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
}

impl CaptureStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// A capture device fed through a channel.
pub(crate) struct ChannelCapture {
    name: String,
    frames: Receiver<Vec<u8>>,
    current: Vec<u8>,
    fail_open: bool,
    opened: bool,
    stats: Arc<CaptureStats>,
}

impl ChannelCapture {
    pub fn new(name: &str, stats: Arc<CaptureStats>) -> (Self, Sender<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let capture = Self {
            name: name.to_string(),
            frames: rx,
            current: Vec::new(),
            fail_open: false,
            opened: false,
            stats,
        };
        (capture, tx)
    }

    pub fn failing(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

impl PacketCapture for ChannelCapture {
    fn interface_name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        if self.fail_open {
            return Err(CaptureError::ChannelCreation("scripted failure".to_string()));
        }
        self.opened = true;
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        match self.frames.recv_timeout(Duration::from_millis(10)) {
            Ok(frame) => {
                self.current = frame;
                Ok(Some(&self.current))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(Duration::from_millis(10));
                Ok(None)
            }
        }
    }
}

impl Drop for ChannelCapture {
    fn drop(&mut self) {
        if self.opened {
            self.stats.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Hands out one fresh `ChannelCapture` per session and keeps the feeds.
#[derive(Default)]
pub(crate) struct TestProvider {
    feeds: Mutex<Vec<Sender<Vec<u8>>>>,
    pub stats: Arc<CaptureStats>,
}

impl TestProvider {
    pub fn sessions(&self) -> usize {
        self.feeds.lock().unwrap().len()
    }

    /// Feed a frame to the capture of the latest session.
    pub fn send(&self, frame: Vec<u8>) {
        if let Some(feed) = self.feeds.lock().unwrap().last() {
            let _ = feed.send(frame);
        }
    }

    /// Feed a frame to the capture of an earlier session.
    pub fn send_to_session(&self, session: usize, frame: Vec<u8>) {
        if let Some(feed) = self.feeds.lock().unwrap().get(session) {
            let _ = feed.send(frame);
        }
    }

    pub async fn wait_for_sessions(&self, count: usize) {
        while self.sessions() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl InterfaceProvider for TestProvider {
    fn captures(&self) -> Vec<Box<dyn PacketCapture>> {
        let (capture, feed) = ChannelCapture::new("test0", self.stats.clone());
        self.feeds.lock().unwrap().push(feed);
        vec![Box::new(capture)]
    }
}

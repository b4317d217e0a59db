//! pnet-based packet capture implementation.

use std::io::ErrorKind;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, NetworkInterface};

use super::{InterfaceProvider, PacketCapture};
use crate::error::CaptureError;

/// Read timeout; bounds how long a capture loop can miss a cancellation
const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Receive buffer size; large enough for offload-coalesced segments
const READ_BUFFER_SIZE: usize = 65536;

/// Packet capture on one interface using the pnet library.
pub struct PnetCapture {
    interface: NetworkInterface,
    rx: Option<Box<dyn DataLinkReceiver>>,
}

impl PnetCapture {
    pub fn from_interface(interface: NetworkInterface) -> Self {
        Self { interface, rx: None }
    }

    /// One capture per usable interface.
    ///
    /// Usable means up, not loopback, with an address and an Ethernet
    /// (MAC) link.
    pub fn all_interfaces() -> Vec<Self> {
        datalink::interfaces()
            .into_iter()
            .filter(is_capturable)
            .map(Self::from_interface)
            .collect()
    }

    /// List all available network interfaces.
    pub fn list_interfaces() -> Vec<String> {
        datalink::interfaces()
            .into_iter()
            .map(|iface| {
                let status = if iface.is_up() { "UP" } else { "DOWN" };
                let ips: Vec<_> = iface.ips.iter().map(|ip| ip.to_string()).collect();
                format!(
                    "{}: {} [{}]{}",
                    iface.name,
                    status,
                    if ips.is_empty() {
                        "no IP".to_string()
                    } else {
                        ips.join(", ")
                    },
                    if is_capturable(&iface) { "" } else { " (skipped)" }
                )
            })
            .collect()
    }
}

fn is_capturable(iface: &NetworkInterface) -> bool {
    iface.is_up() && !iface.is_loopback() && !iface.ips.is_empty() && iface.mac.is_some()
}

impl PacketCapture for PnetCapture {
    fn interface_name(&self) -> &str {
        &self.interface.name
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        let config = Config {
            read_timeout: Some(READ_TIMEOUT),
            read_buffer_size: READ_BUFFER_SIZE,
            promiscuous: true,
            ..Config::default()
        };

        let rx = match datalink::channel(&self.interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err(CaptureError::UnsupportedLinkType(self.interface.name.clone())),
            Err(e) => {
                let msg = e.to_string();
                if e.kind() == ErrorKind::PermissionDenied
                    || msg.contains("permission")
                    || msg.contains("Operation not permitted")
                {
                    return Err(CaptureError::InsufficientPermissions);
                }
                return Err(CaptureError::ChannelCreation(format!(
                    "{}: {}",
                    self.interface.name, msg
                )));
            }
        };

        self.rx = Some(rx);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        let rx = self
            .rx
            .as_mut()
            .ok_or_else(|| CaptureError::NotOpened(self.interface.name.clone()))?;

        match rx.next() {
            Ok(frame) => Ok(Some(frame)),
            // Timeout is expected, it is the cancellation tick
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) => Err(CaptureError::Io(e)),
        }
    }
}

/// Provides a `PnetCapture` for every usable interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct PnetInterfaces;

impl InterfaceProvider for PnetInterfaces {
    fn captures(&self) -> Vec<Box<dyn PacketCapture>> {
        PnetCapture::all_interfaces()
            .into_iter()
            .map(|capture| Box::new(capture) as Box<dyn PacketCapture>)
            .collect()
    }
}

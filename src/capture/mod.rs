//! Packet capture abstraction.
//!
//! This module defines the `PacketCapture` trait and provides a pnet-based
//! implementation, plus the frame classification every capture loop
//! applies before handing segments to the flow coordinator.

mod frame;
mod pnet_capture;
#[cfg(test)]
pub(crate) mod testing;

pub use frame::{classify_frame, TrafficFilter};
pub use pnet_capture::{PnetCapture, PnetInterfaces};

use std::sync::Arc;

use crate::error::CaptureError;

/// One live capture device.
///
/// The device handle is owned by the implementation and released when
/// the value is dropped, so every exit path of a capture loop closes it.
pub trait PacketCapture: Send {
    /// Get the name of the interface being captured.
    fn interface_name(&self) -> &str;

    /// Open the device for live capture.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Block for the next raw link-layer frame.
    ///
    /// Returns `Ok(None)` when the read timed out without a frame, which
    /// gives the caller a chance to observe cancellation.
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError>;
}

/// Source of capture devices for a new session.
pub trait InterfaceProvider: Send + Sync {
    /// Fresh, unopened captures for every interface to listen on.
    fn captures(&self) -> Vec<Box<dyn PacketCapture>>;
}

impl<P: InterfaceProvider + ?Sized> InterfaceProvider for Arc<P> {
    fn captures(&self) -> Vec<Box<dyn PacketCapture>> {
        (**self).captures()
    }
}

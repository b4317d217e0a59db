//! Capture session module.
//!
//! Runs one capture loop per interface for a target and delivers
//! finished flows to a single consumer.

mod capture_session;

pub use capture_session::{CaptureSession, CompletedFlows, SessionConfig};

//! Server list detection module.
//!
//! This module is responsible for picking the server list reply out of
//! the payload chunks of a completed flow.

mod server_list_detector;

pub use server_list_detector::ServerListDetector;

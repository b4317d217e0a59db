//! Reporting module for decoded server lists.
//!
//! This module defines the `ServerListReporter` trait and provides
//! implementations for different output formats.

mod console_reporter;

pub use console_reporter::ConsoleReporter;

use crate::domain::{SubServer, Target};

/// Trait for reporting the outcome of a capture.
///
/// Reporters only present results. Capturing and decoding happen
/// elsewhere, so the same reporter works for every target.
pub trait ServerListReporter: Send {
    /// Called when a capture starts.
    fn on_start(&self, target: &Target);

    /// Report a decoded server list.
    fn report(&self, target: &Target, servers: &[SubServer]);

    /// Called when the capture ended without a server list.
    fn on_nothing_found(&self, target: &Target);
}

//! rosniff - passive login-server listener.
//!
//! Watches TCP traffic from a game login server, reassembles each reply
//! flow and decodes the sub-server list (names, addresses, population)
//! it carries.

pub mod capture;
pub mod config;
pub mod detector;
pub mod domain;
pub mod error;
pub mod flow;
pub mod monitor;
pub mod parser;
pub mod reporter;
pub mod session;
pub mod utils;

pub use config::Config;
pub use domain::{Population, ResponseEncoding, ServerStatus, SubServer, Target};
pub use error::{CaptureError, ConfigError, DecodeError, MonitorError};
pub use monitor::Monitor;

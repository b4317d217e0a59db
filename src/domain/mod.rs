//! Domain models for passive server list monitoring.
//!
//! This module contains the core domain types that are independent
//! of any capture or parsing infrastructure.

mod flow;
mod server;
mod target;

pub use flow::{FlowKey, FlowRecord, Payload, TcpSegment};
pub use server::{Population, ResponseEncoding, ServerStatus, SubServer};
pub use target::Target;

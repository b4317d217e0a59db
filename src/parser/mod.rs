//! Server list reply parsing module.
//!
//! This module is responsible for decoding captured payloads into
//! sub-server records, one record layout per reply encoding.

mod server_list_parser;

pub use server_list_parser::{RecordLayout, ServerListParser};

#[cfg(test)]
pub(crate) use server_list_parser::tests as fixtures;

//! Server list detection over completed flows.

use tracing::debug;

use crate::domain::{FlowRecord, SubServer, Target};
use crate::parser::ServerListParser;

/// Finds the server list reply among the payload chunks of a flow.
///
/// The full list is expected to be the largest segment, so chunks are
/// tried longest first and the first one that decodes wins. Chunks are
/// decoded independently; no reassembly is attempted.
pub struct ServerListDetector {
    parser: ServerListParser,
}

impl ServerListDetector {
    pub fn new(parser: ServerListParser) -> Self {
        Self { parser }
    }

    pub fn for_target(target: &Target) -> Self {
        Self::new(ServerListParser::for_target(target))
    }

    /// Returns the decoded sub-servers, or None if no chunk matched.
    pub fn detect(&self, flow: &FlowRecord) -> Option<Vec<SubServer>> {
        for (attempt, chunk) in flow.chunks_by_length_desc().into_iter().enumerate() {
            match self.parser.parse(chunk) {
                Ok(servers) => {
                    debug!(
                        "Decoded {} sub-servers from chunk {} ({} bytes) of {}",
                        servers.len(),
                        attempt,
                        chunk.len(),
                        flow.key
                    );
                    return Some(servers);
                }
                Err(e) => {
                    debug!("Chunk {} ({} bytes) of {}: {}", attempt, chunk.len(), flow.key, e);
                }
            }
        }

        None
    }
}

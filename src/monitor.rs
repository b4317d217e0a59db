//! Start/stop control surface.
//!
//! A `Monitor` runs at most one capture session at a time. Starting a new
//! capture fully stops the previous one first.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::capture::{InterfaceProvider, PnetInterfaces};
use crate::detector::ServerListDetector;
use crate::domain::{SubServer, Target};
use crate::error::MonitorError;
use crate::session::{CaptureSession, SessionConfig};

pub struct Monitor {
    targets: Vec<Target>,
    provider: Box<dyn InterfaceProvider>,
    session_config: SessionConfig,
    active: Mutex<Option<CaptureSession>>,
}

impl Monitor {
    /// Create a monitor capturing on every usable network interface.
    pub fn new(targets: Vec<Target>, session_config: SessionConfig) -> Self {
        Self::with_provider(targets, session_config, Box::new(PnetInterfaces))
    }

    pub fn with_provider(
        targets: Vec<Target>,
        session_config: SessionConfig,
        provider: Box<dyn InterfaceProvider>,
    ) -> Self {
        Self {
            targets,
            provider,
            session_config,
            active: Mutex::new(None),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|target| target.name == name)
    }

    pub async fn is_capturing(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Capture until the target's server list is seen or the capture is
    /// stopped.
    ///
    /// Returns `Ok(None)` when stopped (or when no interface could capture)
    /// before a server list was decoded.
    pub async fn start(&self, target_name: &str) -> Result<Option<Vec<SubServer>>, MonitorError> {
        let target = self
            .target(target_name)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownTarget(target_name.to_string()))?;

        info!("Starting capture for target: {}", target);

        let (session_id, mut completed) = {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                warn!("Already capturing, stopping the previous capture");
                previous.stop().await;
            }

            let (session, completed) =
                CaptureSession::start(&target, self.provider.captures(), self.session_config);
            let id = session.id();
            *active = Some(session);
            (id, completed)
        };

        let detector = ServerListDetector::for_target(&target);

        let servers = loop {
            let Some(flow) = completed.next().await else {
                debug!("Capture session {} ended without a server list", session_id);
                break None;
            };

            match detector.detect(&flow) {
                Some(servers) => break Some(servers),
                None => debug!("No server list in flow {}", flow.key),
            }
        };

        self.finish(session_id).await;

        Ok(servers)
    }

    /// Stop the running capture, if any. Idempotent.
    pub async fn stop(&self) {
        let session = self.active.lock().await.take();

        match session {
            Some(session) => session.stop().await,
            None => debug!("No capture session to stop"),
        }
    }

    /// Stop the given session unless it was already stopped or replaced.
    async fn finish(&self, session_id: u64) {
        let mut active = self.active.lock().await;
        if active.as_ref().map(CaptureSession::id) == Some(session_id) {
            if let Some(session) = active.take() {
                session.stop().await;
            }
        }
    }
}

//! Live capture session for one target.
//!
//! One blocking capture loop runs per interface. Loops classify frames and
//! send the target's segments to a single coordinator task, which owns the
//! flow table and emits finished flows to the consumer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::{classify_frame, PacketCapture, TrafficFilter};
use crate::domain::{FlowRecord, Target, TcpSegment};
use crate::flow::FlowTable;

/// Consecutive read errors after which an interface is given up
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Tunables for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Flows with no segment for this long are finalized
    pub idle_timeout: Duration,
    /// How often the coordinator looks for idle flows
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

/// A running capture against one target.
///
/// Dropping the session raises its cancellation signal; `stop` also waits
/// for every interface loop to release its device.
pub struct CaptureSession {
    id: u64,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    coordinator: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Start capturing on the given devices.
    ///
    /// Must be called from within a Tokio runtime. Devices that fail to
    /// open are logged and skipped; the others keep capturing.
    pub fn start(
        target: &Target,
        captures: Vec<Box<dyn PacketCapture>>,
        config: SessionConfig,
    ) -> (Self, CompletedFlows) {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let filter = TrafficFilter::for_target(target);

        info!(
            "Starting capture session {} for {} with filter: {}",
            id,
            target.name,
            target.filter_expression()
        );

        if captures.is_empty() {
            warn!("No capturable network interfaces found");
        }

        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();

        let workers = captures
            .into_iter()
            .map(|capture| {
                let cancel = cancel.clone();
                let segments = segment_tx.clone();
                tokio::task::spawn_blocking(move || capture_loop(capture, filter, cancel, segments))
            })
            .collect();

        // The coordinator sees the channel close once every loop has ended
        drop(segment_tx);

        let coordinator = tokio::spawn(coordinate(segment_rx, completed_tx, cancel.clone(), config));

        let session = Self {
            id,
            cancel: cancel.clone(),
            workers,
            coordinator: Some(coordinator),
        };

        let completed = CompletedFlows {
            rx: completed_rx,
            cancel,
        };

        (session, completed)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Raise the cancellation signal without waiting. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!("Cancelling capture session {}", self.id);
            self.cancel.cancel();
        }
    }

    /// Cancel and wait until every interface loop and the coordinator
    /// have finished, so no device handle outlives the session.
    pub async fn stop(mut self) {
        self.cancel();

        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                warn!("Capture loop of session {} failed: {}", self.id, e);
            }
        }

        if let Some(coordinator) = self.coordinator.take() {
            if let Err(e) = coordinator.await {
                warn!("Coordinator of session {} failed: {}", self.id, e);
            }
        }

        info!("Capture session {} stopped", self.id);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The consumer side of a session: finished flows, in completion order.
pub struct CompletedFlows {
    rx: UnboundedReceiver<FlowRecord>,
    cancel: CancellationToken,
}

impl CompletedFlows {
    /// Wait for the next finished flow.
    ///
    /// Returns None once the session is cancelled, or when capture ended on
    /// every interface and all flows have been delivered.
    pub async fn next(&mut self) -> Option<FlowRecord> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            flow = self.rx.recv() => flow,
        }
    }
}

/// Blocking capture loop for one interface.
fn capture_loop(
    mut capture: Box<dyn PacketCapture>,
    filter: TrafficFilter,
    cancel: CancellationToken,
    segments: UnboundedSender<TcpSegment>,
) {
    let name = capture.interface_name().to_string();

    if let Err(e) = capture.open() {
        warn!("Unable to capture on interface {}: {}", name, e);
        return;
    }

    info!("Start sniffing on interface: {}", name);

    let mut consecutive_errors = 0;

    while !cancel.is_cancelled() {
        match capture.next_frame() {
            Ok(Some(frame)) => {
                consecutive_errors = 0;
                let Some(segment) = classify_frame(frame, &filter) else {
                    continue;
                };
                if segments.send(segment).is_err() {
                    // Coordinator is gone
                    break;
                }
            }
            Ok(None) => consecutive_errors = 0,
            Err(e) => {
                consecutive_errors += 1;
                debug!("Capture error on {}: {}", name, e);
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    warn!("Giving up on interface {} after repeated errors: {}", name, e);
                    break;
                }
            }
        }
    }

    drop(capture);
    debug!("Stopped sniffing on interface: {}", name);
}

/// Owns the flow table for the lifetime of the session.
async fn coordinate(
    mut segments: UnboundedReceiver<TcpSegment>,
    completed: UnboundedSender<FlowRecord>,
    cancel: CancellationToken,
    config: SessionConfig,
) {
    let mut table = FlowTable::new();
    let mut sweep = tokio::time::interval(config.sweep_interval);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            segment = segments.recv() => {
                let Some(segment) = segment else {
                    // Every capture loop ended; hand over what we have
                    flush(&mut table, &completed);
                    break;
                };
                if cancel.is_cancelled() {
                    break;
                }
                if let Some(finished) = table.ingest(segment, Instant::now()) {
                    info!(
                        "Flow {} closed with {} chunks ({} bytes)",
                        finished.key,
                        finished.chunks.len(),
                        finished.payload_len()
                    );
                    let _ = completed.send(finished);
                }
            }
            _ = sweep.tick() => {
                for idle in table.evict_idle(Instant::now(), config.idle_timeout) {
                    finalize_idle(idle, &completed);
                }
            }
        }
    }

    debug!("Coordinator exiting with {} open flows", table.len());
}

fn finalize_idle(record: FlowRecord, completed: &UnboundedSender<FlowRecord>) {
    if !record.has_payload() {
        debug!("Dropping idle flow {} without payload", record.key);
        return;
    }
    info!("Flow {} idle, finalizing {} chunks", record.key, record.chunks.len());
    let _ = completed.send(record);
}

fn flush(table: &mut FlowTable, completed: &UnboundedSender<FlowRecord>) {
    for record in table.evict_idle(Instant::now(), Duration::ZERO) {
        finalize_idle(record, completed);
    }
}

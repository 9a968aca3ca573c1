//! Payload correlation: one buffered small payload and one tracked in-progress transfer.
//!
//! This is best-effort matching, not a queue. A progress update that arrives while a small payload
//! is buffered is taken to be the echo of that payload and swallowed. An empty payload does not
//! count as buffered.

use tracing::debug;

use crate::event::{PayloadId, TransferStatus, TransferUpdate};

/// What the translator should report for a transfer update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Large transfer in progress; report progress.
    Progress,
    /// Tracked transfer finished; report completion.
    Completed,
    /// Tracked transfer failed or was canceled; report the status.
    Failed,
    /// Echo of the buffered small payload; report nothing.
    Swallowed,
    /// Not correlated with anything tracked; report nothing.
    Ignored,
}

impl UpdateOutcome {
    pub fn is_reported(self) -> bool {
        matches!(
            self,
            UpdateOutcome::Progress | UpdateOutcome::Completed | UpdateOutcome::Failed
        )
    }
}

/// Single-slot payload tracker.
#[derive(Debug, Default)]
pub struct PendingPayload {
    buffered: Option<String>,
    in_progress: Option<PayloadId>,
}

impl PendingPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a fully received payload as text (lossy UTF-8) and buffer it. Returns the text.
    pub fn on_received(&mut self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.buffered = Some(text.clone());
        text
    }

    pub fn on_update(&mut self, update: &TransferUpdate, report_failed: bool) -> UpdateOutcome {
        match update.status {
            TransferStatus::InProgress => {
                if self.buffered.take().is_some_and(|s| !s.is_empty()) {
                    UpdateOutcome::Swallowed
                } else {
                    self.in_progress = Some(update.payload_id);
                    UpdateOutcome::Progress
                }
            }
            TransferStatus::Success => self.finish(update.payload_id, UpdateOutcome::Completed),
            TransferStatus::Failure | TransferStatus::Canceled if report_failed => {
                self.finish(update.payload_id, UpdateOutcome::Failed)
            }
            TransferStatus::Failure | TransferStatus::Canceled => UpdateOutcome::Ignored,
        }
    }

    fn finish(&mut self, id: PayloadId, outcome: UpdateOutcome) -> UpdateOutcome {
        if self.in_progress == Some(id) {
            self.in_progress = None;
            outcome
        } else {
            UpdateOutcome::Ignored
        }
    }

    pub fn buffered(&self) -> Option<&str> {
        self.buffered.as_deref()
    }

    pub fn in_progress(&self) -> Option<PayloadId> {
        self.in_progress
    }
}

/// Id sent to the app layer: the second `separator`-delimited segment of the decimal rendering.
///
/// Platform ids are negative, so `-4471` becomes `4471`. Renderings without a second segment are
/// sent whole.
pub fn wire_payload_id(id: PayloadId, separator: char) -> String {
    let rendered = id.0.to_string();
    match rendered.split(separator).nth(1) {
        Some(segment) => segment.to_owned(),
        None => {
            debug!(payload_id = id.0, "payload id has no suffix segment, sending it whole");
            rendered
        }
    }
}

//! Inbound platform events: discovery, connection lifecycle, payload transfer, service binding.
//!
//! JSON form is tagged by `"event"` (snake_case) with camelCase fields, e.g.
//! `{"event":"endpoint_found","deviceId":"A1B2","endpointName":"Printer"}`.

use serde::{Deserialize, Serialize};

use crate::peer::PeerId;

/// Status code from a connection resolution. Platform failures are already collapsed into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(0);
    pub const ERROR: StatusCode = StatusCode(13);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

/// Platform-assigned payload id (a signed 64-bit value on the platform side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadId(pub i64);

/// Transfer status integers as the platform reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum TransferStatus {
    Success,
    Failure,
    InProgress,
    Canceled,
}

impl TransferStatus {
    pub fn as_i32(self) -> i32 {
        match self {
            TransferStatus::Success => 1,
            TransferStatus::Failure => 2,
            TransferStatus::InProgress => 3,
            TransferStatus::Canceled => 4,
        }
    }
}

impl From<TransferStatus> for i32 {
    fn from(s: TransferStatus) -> i32 {
        s.as_i32()
    }
}

impl TryFrom<i32> for TransferStatus {
    type Error = UnknownTransferStatus;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(TransferStatus::Success),
            2 => Ok(TransferStatus::Failure),
            3 => Ok(TransferStatus::InProgress),
            4 => Ok(TransferStatus::Canceled),
            other => Err(UnknownTransferStatus(other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown transfer status {0}")]
pub struct UnknownTransferStatus(pub i32);

/// Progress report for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferUpdate {
    pub payload_id: PayloadId,
    pub status: TransferStatus,
    #[serde(default)]
    pub bytes_transferred: u64,
    #[serde(default)]
    pub total_bytes: u64,
}

impl TransferUpdate {
    pub fn new(payload_id: PayloadId, status: TransferStatus) -> Self {
        Self {
            payload_id,
            status,
            bytes_transferred: 0,
            total_bytes: 0,
        }
    }
}

/// Service binding lifecycle, reported by the host's OS glue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingEvent {
    /// Result of the bind request itself (not yet connected).
    BindRequested { accepted: bool },
    ServiceConnected,
    ServiceDisconnected,
    BindingDied,
    NullBinding,
    UnbindFailed { message: String },
}

/// Everything the platform can tell the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PlatformEvent {
    EndpointFound {
        device_id: PeerId,
        endpoint_name: String,
    },
    EndpointLost {
        device_id: PeerId,
    },
    ConnectionInitiated {
        device_id: PeerId,
        endpoint_name: String,
    },
    ConnectionResult {
        device_id: PeerId,
        status_code: StatusCode,
    },
    Disconnected {
        device_id: PeerId,
    },
    /// Whole payload delivered in memory (small byte messages only).
    PayloadReceived {
        device_id: PeerId,
        payload_id: PayloadId,
        bytes: Vec<u8>,
    },
    PayloadTransferUpdate {
        device_id: PeerId,
        update: TransferUpdate,
    },
    Binding {
        change: BindingEvent,
    },
}

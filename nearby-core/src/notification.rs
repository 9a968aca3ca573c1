//! Outward notifications for the application layer, and the channel method each one is sent on.

use crate::event::{StatusCode, TransferStatus};
use crate::peer::PeerId;
use crate::roster::RosterSnapshot;

pub const METHOD_ROSTER_CHANGED: &str = "invoke_change_state_method";
pub const METHOD_MESSAGE_RECEIVED: &str = "invoke_message_receive_method";
pub const METHOD_PAYLOAD_TRANSFER_UPDATE: &str = "invoke_payload_transfer_update_method";
pub const METHOD_CONNECTION_RESULT: &str = "invoke_callback_util_method";
pub const METHOD_BINDING_STATE_CHANGED: &str = "nearby_running";
pub const METHOD_OPERATION_FAILED: &str = "invoke_operation_failed_method";

/// One-way message to the app layer. No acknowledgment is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Whole roster, sent after every roster mutation.
    RosterChanged(RosterSnapshot),
    MessageReceived {
        device_id: PeerId,
        message: String,
        payload_id: String,
    },
    PayloadTransferUpdate {
        device_id: PeerId,
        status: TransferStatus,
        payload_id: String,
    },
    /// Raw status of a connection attempt, in addition to the roster broadcast.
    ConnectionResult {
        device_id: PeerId,
        status: StatusCode,
    },
    BindingStateChanged(bool),
    /// A host-side operation failed and was not retried.
    OperationFailed {
        operation: String,
        message: String,
    },
}

impl Notification {
    pub fn method(&self) -> &'static str {
        match self {
            Notification::RosterChanged(_) => METHOD_ROSTER_CHANGED,
            Notification::MessageReceived { .. } => METHOD_MESSAGE_RECEIVED,
            Notification::PayloadTransferUpdate { .. } => METHOD_PAYLOAD_TRANSFER_UPDATE,
            Notification::ConnectionResult { .. } => METHOD_CONNECTION_RESULT,
            Notification::BindingStateChanged(_) => METHOD_BINDING_STATE_CHANGED,
            Notification::OperationFailed { .. } => METHOD_OPERATION_FAILED,
        }
    }

    pub fn is_roster_changed(&self) -> bool {
        matches!(self, Notification::RosterChanged(_))
    }
}

//! Host-driven API: NearbyCore receives platform events from the host, returns actions.

use serde::Serialize;
use tracing::{debug, info};

use crate::binding::ServiceBinding;
use crate::config::CoreConfig;
use crate::event::{BindingEvent, PayloadId, PlatformEvent, StatusCode, TransferUpdate};
use crate::notification::Notification;
use crate::payload::{self, PendingPayload, UpdateOutcome};
use crate::peer::{ConnectionState, PeerId};
use crate::roster::{Roster, RosterSnapshot};

/// Imperative call into the platform SDK. Fire-and-forget: results come back later as events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PlatformCommand {
    Disconnect {
        device_id: PeerId,
    },
    /// Accept the connection and route this peer's payload events back into the core.
    AcceptConnection {
        device_id: PeerId,
    },
    BindService,
    /// Hand the event callbacks to the freshly bound service.
    InitService,
    UnbindService,
    /// Stop the foreground service and the service itself.
    StopService,
}

/// Action for host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Notify(Notification),
    Command(PlatformCommand),
}

impl Action {
    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            Action::Notify(n) => Some(n),
            Action::Command(_) => None,
        }
    }

    pub fn as_command(&self) -> Option<&PlatformCommand> {
        match self {
            Action::Command(c) => Some(c),
            Action::Notify(_) => None,
        }
    }
}

/// Event translator. Owns the roster and the payload tracker; single writer.
pub struct NearbyCore {
    roster: Roster,
    pending: PendingPayload,
    binding: ServiceBinding,
    config: CoreConfig,
}

impl NearbyCore {
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            roster: Roster::new(),
            pending: PendingPayload::new(),
            binding: ServiceBinding::new(),
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn binding(&self) -> &ServiceBinding {
        &self.binding
    }

    /// Dispatch one platform event.
    pub fn handle(&mut self, event: PlatformEvent) -> Vec<Action> {
        match event {
            PlatformEvent::EndpointFound {
                device_id,
                endpoint_name,
            } => self.on_endpoint_found(device_id, endpoint_name),
            PlatformEvent::EndpointLost { device_id } => self.on_endpoint_lost(&device_id),
            PlatformEvent::ConnectionInitiated {
                device_id,
                endpoint_name,
            } => self.on_connection_initiated(device_id, endpoint_name),
            PlatformEvent::ConnectionResult {
                device_id,
                status_code,
            } => self.on_connection_result(device_id, status_code),
            PlatformEvent::Disconnected { device_id } => self.on_disconnected(device_id),
            PlatformEvent::PayloadReceived {
                device_id,
                payload_id,
                bytes,
            } => self.on_payload_received(device_id, payload_id, &bytes),
            PlatformEvent::PayloadTransferUpdate { device_id, update } => {
                self.on_payload_transfer_update(device_id, &update)
            }
            PlatformEvent::Binding { change } => self.on_binding_event(change),
        }
    }

    /// Endpoint discovered. Known peers are left alone: a connection may be in progress.
    pub fn on_endpoint_found(&mut self, id: PeerId, name: String) -> Vec<Action> {
        if self.roster.exists(&id) {
            debug!(peer = %id, "endpoint found again, already tracked");
            return vec![];
        }
        debug!(peer = %id, %name, "endpoint found");
        let snapshot = self
            .roster
            .upsert(&id, Some(name), ConnectionState::NotConnected);
        vec![roster_changed(snapshot)]
    }

    /// Endpoint out of range. Drop any connection to it, then forget it.
    /// The roster is broadcast either way; only a tracked peer gets a disconnect.
    pub fn on_endpoint_lost(&mut self, id: &PeerId) -> Vec<Action> {
        let mut actions = Vec::with_capacity(2);
        if self.roster.exists(id) {
            info!(peer = %id, "endpoint lost");
            actions.push(Action::Command(PlatformCommand::Disconnect {
                device_id: id.clone(),
            }));
        } else {
            debug!(peer = %id, "lost endpoint was never tracked");
        }
        actions.push(roster_changed(self.roster.remove(id)));
        actions
    }

    /// Incoming or outgoing connection being negotiated. Always accepted.
    pub fn on_connection_initiated(&mut self, id: PeerId, name: String) -> Vec<Action> {
        debug!(peer = %id, %name, "connection initiated, accepting");
        let snapshot = self
            .roster
            .upsert(&id, Some(name), ConnectionState::Connecting);
        vec![
            roster_changed(snapshot),
            Action::Command(PlatformCommand::AcceptConnection { device_id: id }),
        ]
    }

    pub fn on_connection_result(&mut self, id: PeerId, status: StatusCode) -> Vec<Action> {
        let state = if status.is_ok() {
            info!(peer = %id, "connection established");
            ConnectionState::Connected
        } else {
            info!(peer = %id, status = status.0, "connection failed");
            ConnectionState::NotConnected
        };
        let name = self.roster.lookup(&id).and_then(|r| r.name.clone());
        let snapshot = self.roster.upsert(&id, name, state);
        vec![
            roster_changed(snapshot),
            Action::Notify(Notification::ConnectionResult {
                device_id: id,
                status,
            }),
        ]
    }

    pub fn on_disconnected(&mut self, id: PeerId) -> Vec<Action> {
        if self.roster.exists(&id) {
            info!(peer = %id, "disconnected");
        } else {
            debug!(peer = %id, "disconnect from untracked peer, inserting");
        }
        let snapshot = self
            .roster
            .upsert(&id, None, ConnectionState::NotConnected);
        vec![roster_changed(snapshot)]
    }

    pub fn on_payload_received(
        &mut self,
        id: PeerId,
        payload_id: PayloadId,
        bytes: &[u8],
    ) -> Vec<Action> {
        let message = self.pending.on_received(bytes);
        debug!(peer = %id, payload_id = payload_id.0, len = bytes.len(), "payload received");
        vec![Action::Notify(Notification::MessageReceived {
            device_id: id,
            message,
            payload_id: self.wire_payload_id(payload_id),
        })]
    }

    pub fn on_payload_transfer_update(
        &mut self,
        id: PeerId,
        update: &TransferUpdate,
    ) -> Vec<Action> {
        let outcome = self
            .pending
            .on_update(update, self.config.report_failed_transfers);
        debug!(
            peer = %id,
            payload_id = update.payload_id.0,
            status = ?update.status,
            bytes = update.bytes_transferred,
            total = update.total_bytes,
            ?outcome,
            "payload transfer update"
        );
        if !outcome.is_reported() {
            return vec![];
        }
        if outcome == UpdateOutcome::Failed {
            info!(peer = %id, payload_id = update.payload_id.0, status = ?update.status, "payload transfer did not complete");
        }
        vec![Action::Notify(Notification::PayloadTransferUpdate {
            device_id: id,
            status: update.status,
            payload_id: self.wire_payload_id(update.payload_id),
        })]
    }

    pub fn on_binding_event(&mut self, event: BindingEvent) -> Vec<Action> {
        self.binding.on_event(event)
    }

    pub fn bind(&self) -> Vec<Action> {
        self.binding.bind()
    }

    pub fn unbind(&self) -> Vec<Action> {
        self.binding.unbind()
    }

    fn wire_payload_id(&self, id: PayloadId) -> String {
        payload::wire_payload_id(id, self.config.payload_id_separator)
    }
}

impl Default for NearbyCore {
    fn default() -> Self {
        Self::new()
    }
}

fn roster_changed(snapshot: RosterSnapshot) -> Action {
    Action::Notify(Notification::RosterChanged(snapshot))
}

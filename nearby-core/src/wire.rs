//! Method-channel encoding: actions out as JSON envelopes, platform events in as tagged JSON.
//!
//! Notification: `{"method": "...", "arguments": ...}`. Command: `{"command": "...", ...}`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{CoreConfig, LEGACY_NULL_NAME};
use crate::core::Action;
use crate::event::PlatformEvent;
use crate::notification::Notification;
use crate::peer::ConnectionState;
use crate::roster::RosterSnapshot;

/// Envelope layout version. Bumped when method names or argument shapes change.
pub const PROTOCOL_VERSION: u8 = 1;

/// Largest inbound event accepted, in bytes.
pub const MAX_EVENT_LEN: usize = 16 * 1024 * 1024; // 16 MiB

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RosterEntry<'a> {
    device_id: &'a str,
    outlet_name: Option<&'a str>,
    state: ConnectionState,
}

#[derive(Serialize)]
struct Envelope<'a> {
    method: &'a str,
    arguments: Value,
}

/// Roster as the app layer reads it: a JSON array of `{deviceId, outletName, state}`.
pub fn encode_roster(snapshot: &RosterSnapshot, config: &CoreConfig) -> Result<String, WireEncodeError> {
    let entries: Vec<RosterEntry<'_>> = snapshot
        .records()
        .iter()
        .map(|r| RosterEntry {
            device_id: r.id.as_str(),
            outlet_name: match (&r.name, config.legacy_null_name) {
                (Some(n), _) => Some(n.as_str()),
                (None, true) => Some(LEGACY_NULL_NAME),
                (None, false) => None,
            },
            state: r.state,
        })
        .collect();
    Ok(serde_json::to_string(&entries)?)
}

/// Channel arguments for a notification.
pub fn notification_arguments(
    notification: &Notification,
    config: &CoreConfig,
) -> Result<Value, WireEncodeError> {
    let args = match notification {
        // The roster goes over as JSON text, not as a nested value.
        Notification::RosterChanged(snapshot) => Value::String(encode_roster(snapshot, config)?),
        Notification::MessageReceived {
            device_id,
            message,
            payload_id,
        } => json!({
            "deviceId": device_id,
            "message": message,
            "payloadId": payload_id,
        }),
        Notification::PayloadTransferUpdate {
            device_id,
            status,
            payload_id,
        } => json!({
            "deviceId": device_id,
            "status": status,
            "payloadId": payload_id,
        }),
        Notification::ConnectionResult { device_id, status } => json!({
            "deviceId": device_id,
            "status": status,
        }),
        Notification::BindingStateChanged(bound) => Value::Bool(*bound),
        Notification::OperationFailed { operation, message } => json!({
            "operation": operation,
            "message": message,
        }),
    };
    Ok(args)
}

pub fn encode_notification(
    notification: &Notification,
    config: &CoreConfig,
) -> Result<Value, WireEncodeError> {
    let envelope = Envelope {
        method: notification.method(),
        arguments: notification_arguments(notification, config)?,
    };
    Ok(serde_json::to_value(envelope)?)
}

pub fn encode_action(action: &Action, config: &CoreConfig) -> Result<Value, WireEncodeError> {
    match action {
        Action::Notify(n) => encode_notification(n, config),
        Action::Command(c) => Ok(serde_json::to_value(c)?),
    }
}

/// Encode actions as one JSON array.
pub fn encode_actions(actions: &[Action], config: &CoreConfig) -> Result<Vec<u8>, WireEncodeError> {
    let values = actions
        .iter()
        .map(|a| encode_action(a, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_vec(&values)?)
}

/// Encode one action as a newline-terminated JSON line.
pub fn encode_action_line(action: &Action, config: &CoreConfig) -> Result<Vec<u8>, WireEncodeError> {
    let mut out = serde_json::to_vec(&encode_action(action, config)?)?;
    out.push(b'\n');
    Ok(out)
}

/// Error encoding an action for the channel.
#[derive(Debug, thiserror::Error)]
pub enum WireEncodeError {
    #[error("encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one platform event from JSON bytes (surrounding whitespace allowed).
pub fn decode_event(bytes: &[u8]) -> Result<PlatformEvent, WireDecodeError> {
    if bytes.len() > MAX_EVENT_LEN {
        return Err(WireDecodeError::TooLarge);
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(WireDecodeError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Error decoding an inbound event.
#[derive(Debug, thiserror::Error)]
pub enum WireDecodeError {
    #[error("empty event")]
    Empty,
    #[error("event too large")]
    TooLarge,
    #[error("decode error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlatformCommand;
    use crate::event::{StatusCode, TransferStatus};
    use crate::peer::{PeerId, PeerRecord};

    fn snapshot() -> RosterSnapshot {
        RosterSnapshot(vec![
            PeerRecord::new(
                PeerId::from("A"),
                Some("Printer".into()),
                ConnectionState::Connected,
            ),
            PeerRecord::new(PeerId::from("B"), None, ConnectionState::NotConnected),
        ])
    }

    #[test]
    fn roster_with_legacy_null_name() {
        let text = encode_roster(&snapshot(), &CoreConfig::default()).unwrap();
        assert_eq!(
            text,
            r#"[{"deviceId":"A","outletName":"Printer","state":2},{"deviceId":"B","outletName":"Null","state":3}]"#
        );
    }

    #[test]
    fn roster_with_json_null_name() {
        let config = CoreConfig {
            legacy_null_name: false,
            ..CoreConfig::default()
        };
        let value: Value = serde_json::from_str(&encode_roster(&snapshot(), &config).unwrap()).unwrap();
        assert_eq!(value[1]["outletName"], Value::Null);
    }

    #[test]
    fn roster_changed_envelope_carries_text() {
        let n = Notification::RosterChanged(snapshot());
        let v = encode_notification(&n, &CoreConfig::default()).unwrap();
        assert_eq!(v["method"], "invoke_change_state_method");
        assert!(v["arguments"].is_string());
    }

    #[test]
    fn transfer_update_envelope() {
        let n = Notification::PayloadTransferUpdate {
            device_id: PeerId::from("B"),
            status: TransferStatus::Success,
            payload_id: "4242".into(),
        };
        let v = encode_notification(&n, &CoreConfig::default()).unwrap();
        assert_eq!(
            v,
            json!({
                "method": "invoke_payload_transfer_update_method",
                "arguments": {"deviceId": "B", "status": 1, "payloadId": "4242"},
            })
        );
    }

    #[test]
    fn connection_result_and_binding_envelopes() {
        let config = CoreConfig::default();
        let v = encode_notification(
            &Notification::ConnectionResult {
                device_id: PeerId::from("A"),
                status: StatusCode::OK,
            },
            &config,
        )
        .unwrap();
        assert_eq!(v["arguments"], json!({"deviceId": "A", "status": 0}));
        let v = encode_notification(&Notification::BindingStateChanged(true), &config).unwrap();
        assert_eq!(v, json!({"method": "nearby_running", "arguments": true}));
    }

    #[test]
    fn command_encoding() {
        let config = CoreConfig::default();
        let v = encode_action(
            &Action::Command(PlatformCommand::AcceptConnection {
                device_id: PeerId::from("A"),
            }),
            &config,
        )
        .unwrap();
        assert_eq!(v, json!({"command": "accept_connection", "deviceId": "A"}));
        let v = encode_action(&Action::Command(PlatformCommand::StopService), &config).unwrap();
        assert_eq!(v, json!({"command": "stop_service"}));
    }

    #[test]
    fn action_line_is_newline_terminated() {
        let line = encode_action_line(
            &Action::Notify(Notification::BindingStateChanged(false)),
            &CoreConfig::default(),
        )
        .unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        assert!(!line[..line.len() - 1].contains(&b'\n'));
    }

    #[test]
    fn decode_rejects_blank_and_garbage() {
        assert!(matches!(decode_event(b"  \n"), Err(WireDecodeError::Empty)));
        assert!(matches!(decode_event(b"{nope"), Err(WireDecodeError::Json(_))));
        assert!(matches!(
            decode_event(br#"{"event":"warp_drive"}"#),
            Err(WireDecodeError::Json(_))
        ));
    }

    #[test]
    fn decode_with_trailing_newline() {
        let ev = decode_event(b"{\"event\":\"disconnected\",\"deviceId\":\"A\"}\n").unwrap();
        assert_eq!(
            ev,
            PlatformEvent::Disconnected {
                device_id: PeerId::from("A")
            }
        );
    }
}

//! Property-based tests for the roster and the discovery handler.
//!
//! Arbitrary operation sequences are replayed against a plain model (ordered list of ids plus
//! first-seen names) and the roster is checked against it after every step.

use nearby_core::{
    Action, ConnectionState, NearbyCore, Notification, PeerId, PlatformCommand, Roster, StatusCode,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RosterOp {
    Upsert {
        id: u8,
        name: Option<String>,
        state: ConnectionState,
    },
    Remove {
        id: u8,
    },
}

#[derive(Debug, Clone)]
enum CoreOp {
    Found { id: u8, name: String },
    Lost { id: u8 },
    Initiated { id: u8, name: String },
    Result { id: u8, ok: bool },
    Disconnected { id: u8 },
}

fn peer(id: u8) -> PeerId {
    PeerId::new(format!("EP{id}"))
}

fn state_strategy() -> impl Strategy<Value = ConnectionState> {
    prop_oneof![
        Just(ConnectionState::Connecting),
        Just(ConnectionState::Connected),
        Just(ConnectionState::NotConnected),
    ]
}

fn roster_op_strategy() -> impl Strategy<Value = RosterOp> {
    prop_oneof![
        3 => (0u8..8, proptest::option::of("[a-z]{1,6}"), state_strategy())
            .prop_map(|(id, name, state)| RosterOp::Upsert { id, name, state }),
        1 => (0u8..8).prop_map(|id| RosterOp::Remove { id }),
    ]
}

fn core_op_strategy() -> impl Strategy<Value = CoreOp> {
    prop_oneof![
        3 => (0u8..6, "[a-z]{1,6}").prop_map(|(id, name)| CoreOp::Found { id, name }),
        1 => (0u8..6).prop_map(|id| CoreOp::Lost { id }),
        2 => (0u8..6, "[a-z]{1,6}").prop_map(|(id, name)| CoreOp::Initiated { id, name }),
        2 => (0u8..6, any::<bool>()).prop_map(|(id, ok)| CoreOp::Result { id, ok }),
        1 => (0u8..6).prop_map(|id| CoreOp::Disconnected { id }),
    ]
}

fn roster_broadcasts(actions: &[Action]) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, Action::Notify(Notification::RosterChanged(_))))
        .count()
}

proptest! {
    #[test]
    fn prop_one_record_per_live_id(ops in prop::collection::vec(roster_op_strategy(), 0..60)) {
        let mut roster = Roster::new();
        // Model: ids in insertion order with their first-seen name.
        let mut model: Vec<(u8, Option<String>)> = Vec::new();

        for op in ops {
            let snapshot = match op {
                RosterOp::Upsert { id, name, state } => {
                    if !model.iter().any(|(m, _)| *m == id) {
                        model.push((id, name.clone()));
                    }
                    roster.upsert(&peer(id), name, state)
                }
                RosterOp::Remove { id } => {
                    model.retain(|(m, _)| *m != id);
                    roster.remove(&peer(id))
                }
            };

            prop_assert_eq!(snapshot.records().len(), model.len());
            for (record, (id, name)) in snapshot.records().iter().zip(&model) {
                prop_assert_eq!(&record.id, &peer(*id));
                prop_assert_eq!(&record.name, name);
            }
            prop_assert_eq!(snapshot, roster.snapshot());
        }
    }

    #[test]
    fn prop_upsert_never_renames(
        first in "[a-z]{1,6}",
        later in prop::collection::vec((proptest::option::of("[a-z]{1,6}"), state_strategy()), 1..20),
    ) {
        let mut roster = Roster::new();
        let id = peer(1);
        let _ = roster.upsert(&id, Some(first.clone()), ConnectionState::NotConnected);
        for (name, state) in later {
            let _ = roster.upsert(&id, name, state);
            let record = roster.lookup(&id).unwrap();
            prop_assert_eq!(record.name.as_deref(), Some(first.as_str()));
            prop_assert_eq!(record.state, state);
        }
    }

    #[test]
    fn prop_core_events_keep_roster_consistent(ops in prop::collection::vec(core_op_strategy(), 0..60)) {
        let mut core = NearbyCore::new();

        for op in ops {
            let before = core.roster().snapshot();
            let actions = match op.clone() {
                CoreOp::Found { id, name } => core.on_endpoint_found(peer(id), name),
                CoreOp::Lost { id } => core.on_endpoint_lost(&peer(id)),
                CoreOp::Initiated { id, name } => core.on_connection_initiated(peer(id), name),
                CoreOp::Result { id, ok } => {
                    let status = if ok { StatusCode::OK } else { StatusCode::ERROR };
                    core.on_connection_result(peer(id), status)
                }
                CoreOp::Disconnected { id } => core.on_disconnected(peer(id)),
            };

            match op {
                CoreOp::Found { id, .. } if before.get(&peer(id)).is_some() => {
                    // Known peer: nothing changes, nothing is sent.
                    prop_assert!(actions.is_empty());
                    prop_assert_eq!(&core.roster().snapshot(), &before);
                }
                CoreOp::Lost { id } if before.get(&peer(id)).is_none() => {
                    // Unknown peer: no disconnect, one broadcast of the unchanged roster.
                    prop_assert!(actions.iter().all(|a| a.as_command().is_none()));
                    prop_assert_eq!(roster_broadcasts(&actions), 1);
                    prop_assert_eq!(&core.roster().snapshot(), &before);
                }
                CoreOp::Lost { id } => {
                    let disconnects = actions
                        .iter()
                        .filter(|a| matches!(
                            a,
                            Action::Command(PlatformCommand::Disconnect { device_id }) if *device_id == peer(id)
                        ))
                        .count();
                    prop_assert_eq!(disconnects, 1);
                    prop_assert!(!core.roster().exists(&peer(id)));
                    prop_assert_eq!(roster_broadcasts(&actions), 1);
                }
                _ => prop_assert_eq!(roster_broadcasts(&actions), 1),
            }

            // Ids stay unique and surviving records keep their relative order.
            let after = core.roster().snapshot();
            let mut ids: Vec<&PeerId> = after.records().iter().map(|r| &r.id).collect();
            let surviving: Vec<&PeerId> = before
                .records()
                .iter()
                .map(|r| &r.id)
                .filter(|id| after.get(id).is_some())
                .collect();
            prop_assert_eq!(&ids[..surviving.len()], &surviving[..]);
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), after.records().len());
        }
    }
}

//! Nearby connections bridge core: peer roster and platform event translation.
//! Host-driven: no I/O; host passes platform events and receives actions.

pub mod binding;
pub mod config;
pub mod core;
pub mod event;
pub mod ffi;
pub mod notification;
pub mod payload;
pub mod peer;
pub mod roster;
pub mod wire;

pub use binding::ServiceBinding;
pub use config::CoreConfig;
pub use core::{Action, NearbyCore, PlatformCommand};
pub use event::{BindingEvent, PayloadId, PlatformEvent, StatusCode, TransferStatus, TransferUpdate};
pub use notification::Notification;
pub use peer::{ConnectionState, PeerId, PeerRecord};
pub use roster::{Roster, RosterSnapshot};
pub use wire::{decode_event, encode_action, encode_action_line, WireDecodeError, WireEncodeError, MAX_EVENT_LEN, PROTOCOL_VERSION};

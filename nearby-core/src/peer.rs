//! Peer identity and connection state: endpoint ids, roster records, state integers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoint id assigned by the platform SDK. Opaque; stable for the discovery/connection session.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        PeerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        PeerId(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        PeerId(s)
    }
}

/// Connection state of a peer. Sent to the application layer as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ConnectionState {
    Connecting,
    Connected,
    NotConnected,
}

impl ConnectionState {
    pub fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::NotConnected => 3,
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl From<ConnectionState> for u8 {
    fn from(state: ConnectionState) -> u8 {
        state.as_u8()
    }
}

impl TryFrom<u8> for ConnectionState {
    type Error = UnknownStateError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(ConnectionState::Connecting),
            2 => Ok(ConnectionState::Connected),
            3 => Ok(ConnectionState::NotConnected),
            other => Err(UnknownStateError(other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown connection state {0}")]
pub struct UnknownStateError(pub u8);

/// One roster entry. `name` is `None` when the platform never supplied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub id: PeerId,
    pub name: Option<String>,
    pub state: ConnectionState,
}

impl PeerRecord {
    pub fn new(id: PeerId, name: Option<String>, state: ConnectionState) -> Self {
        Self { id, name, state }
    }
}

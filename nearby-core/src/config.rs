//! Core behaviour switches. Hosts load these from their own config (TOML, JSON over FFI).

use serde::Deserialize;

/// Translator configuration. Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Serialize unknown peer names as the string "Null" (what existing app clients expect)
    /// instead of JSON null.
    pub legacy_null_name: bool,
    /// Surface failed/canceled transfers of the tracked payload to the app layer.
    pub report_failed_transfers: bool,
    /// Separator between the segments of a platform payload id's decimal rendering.
    pub payload_id_separator: char,
}

/// Placeholder sent for unknown names when `legacy_null_name` is on.
pub const LEGACY_NULL_NAME: &str = "Null";

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            legacy_null_name: true,
            report_failed_transfers: true,
            payload_id_separator: '-',
        }
    }
}

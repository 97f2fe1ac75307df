use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output encoding for the daemon's log records.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record.
    #[default]
    Json,
    /// Single-line text meant for a terminal.
    Compact,
}

impl LogFormat {
    /// Whether records are emitted as machine-readable objects.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when a [`LogFormat`] name is not recognised.
pub type LogFormatParseError = strum::ParseError;

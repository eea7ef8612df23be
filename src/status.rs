use std::fmt;

use serde::Serialize;

/// Detail text recorded when a provider's sender has no messages in the mailbox.
pub const NO_INCIDENTS: &str = "No incidents";

/// Classification outcome for one provider.
///
/// `Unknown` only appears between seeding and the first completed scan of
/// that provider; after that the reconciler overwrites it every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Unknown,
    Up,
    Down,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "Unknown",
            Status::Up => "Up",
            Status::Down => "Down",
            Status::Error => "Error",
        }
    }

    /// Parses the stored string form back into a variant. Rows are only ever
    /// written by this process, so anything unrecognized is treated as a
    /// corrupt row and read back as `Unknown`.
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "Unknown" => Some(Status::Unknown),
            "Up" => Some(Status::Up),
            "Down" => Some(Status::Down),
            "Error" => Some(Status::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known verdict for one provider, as persisted in the status store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub provider: String,
    pub status: Status,
    pub detail: String,
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(DependentId);
id_newtype!(CaregiverId);
id_newtype!(TransportId);
id_newtype!(SessionId);
id_newtype!(BackgroundCheckId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Nanny,
    Driver,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Nanny => "nanny",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent" => Ok(Role::Parent),
            "nanny" => Ok(Role::Nanny),
            "driver" => Ok(Role::Driver),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Lifecycle status of a session as reported by the backend.
///
/// Parsing is case-insensitive. The caregiver and driver listings use
/// `scheduled` and `in-progress` for what the booking listings call
/// `UPCOMING` and `ACTIVE`; both spellings map to the same variant. Anything
/// else, including a missing or `null` status, becomes
/// [`SessionStatus::Unknown`] instead of failing the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SessionStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
    Unknown(String),
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Upcoming => "UPCOMING",
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Cancelled => "CANCELLED",
            SessionStatus::Unknown(raw) => raw,
        }
    }
}

impl From<String> for SessionStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upcoming" | "scheduled" => SessionStatus::Upcoming,
            "active" | "in-progress" | "in_progress" => SessionStatus::Active,
            "completed" => SessionStatus::Completed,
            "cancelled" | "canceled" => SessionStatus::Cancelled,
            _ => SessionStatus::Unknown(raw),
        }
    }
}

impl From<Option<String>> for SessionStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map(SessionStatus::from).unwrap_or_default()
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Unknown(String::new())
    }
}

impl From<SessionStatus> for String {
    fn from(status: SessionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    Activate,
    Complete,
}

impl SessionTransition {
    pub fn path_segment(self) -> &'static str {
        match self {
            SessionTransition::Activate => "activate",
            SessionTransition::Complete => "complete",
        }
    }
}

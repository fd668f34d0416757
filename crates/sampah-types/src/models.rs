use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. Resolved once per request by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// Lifecycle state of a waste deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    #[default]
    Pending,
    Proses,
    Completed,
    Rejected,
}

impl DepositStatus {
    pub const ALL: [DepositStatus; 4] = [
        Self::Pending,
        Self::Proses,
        Self::Completed,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Proses => "proses",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Whether an admin may move a deposit from `self` to `next`.
    ///
    /// Staying in the same state is always allowed (it is a no-op).
    pub fn can_transition_to(&self, next: DepositStatus) -> bool {
        use DepositStatus::*;
        matches!(
            (*self, next),
            (Pending, Proses) | (Proses, Completed) | (Pending, Rejected) | (Proses, Rejected)
        ) || *self == next
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status. Must be: pending, proses, completed, or rejected")]
pub struct ParseStatusError(pub String);

impl FromStr for DepositStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Notification type tag. Only deposit events produce notifications today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    DepositUpdate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepositUpdate => "deposit_update",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification type '{0}'")]
pub struct ParseKindError(pub String);

impl FromStr for NotificationKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit_update" => Ok(Self::DepositUpdate),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

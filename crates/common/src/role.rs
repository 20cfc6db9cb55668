//! Caller identity as handed over by the external auth subsystem.

use serde::{Deserialize, Serialize};

use crate::ClientId;

/// Role resolved from the `profiles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Staff,
    Client,
    #[default]
    Unknown,
}

impl Role {
    /// Owners and staff may manage inventory, orders and reports.
    pub fn is_back_office(&self) -> bool {
        matches!(self, Role::Owner | Role::Staff)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::Client => "client",
            Role::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    /// Unrecognized names resolve to [`Role::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "owner" => Role::Owner,
            "staff" => Role::Staff,
            "client" => Role::Client,
            _ => Role::Unknown,
        })
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: ClientId,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(user_id: ClientId, role: Role) -> Self {
        Self { user_id, role }
    }
}

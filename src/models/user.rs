//! Identity models: roles, session tokens and the user profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::EntityId;

/// Account role granted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "admin", alias = "ADMIN")]
    Admin,
    #[serde(alias = "client", alias = "CLIENT")]
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Client => "Client",
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
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Token triple issued by login, invitation acceptance and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
}

/// Profile of the signed-in user, as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: EntityId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    /// Domain fields (company, phone, avatar, ...) passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

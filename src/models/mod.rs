// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wire models exchanged with the agency API.

pub mod catalog;
pub mod user;

pub use catalog::{
    AccountStatus, ClientProject, ContactMessage, NewContactMessage, PricingPlan, Project,
    Service, Template, UserAccount,
};
pub use user::{Role, SessionTokens, UserProfile};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-assigned identifier. The backend mixes numeric and string ids,
/// so both are accepted and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

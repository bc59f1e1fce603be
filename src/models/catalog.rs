// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog and back-office models.
//!
//! Only the fields the client layer relies on are typed; everything else the
//! backend sends is kept in `extra` so the UI can render it.

use serde::{Deserialize, Serialize};

use super::{EntityId, Role};

type Extra = serde_json::Map<String, serde_json::Value>;

/// An offered service (web development, branding, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A portfolio project shown on the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A purchasable site template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A pricing plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub id: EntityId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A project the agency runs for the signed-in client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProject {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Whether a managed account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "inactive")]
    Inactive,
}

impl AccountStatus {
    pub fn toggled(self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Inactive,
            AccountStatus::Inactive => AccountStatus::Active,
        }
    }
}

/// A user account as listed in the admin back-office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: EntityId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A message received through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Contact form submission.
#[derive(Debug, Clone, Serialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewContactMessage {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[validate(length(min = 1))]
    pub message: String,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The application's cached collections.

pub mod resource;

pub use resource::Resource;

use crate::api::{endpoints, ApiClient};
use crate::error::{ApiError, Result};
use crate::models::{
    ClientProject, ContactMessage, NewContactMessage, PricingPlan, Project, Service, Template,
    UserAccount,
};
use crate::time_utils::Clock;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// One cache per resource type, created idle at startup.
pub struct Resources {
    pub services: Resource<Service>,
    pub projects: Resource<Project>,
    pub templates: Resource<Template>,
    pub pricing: Resource<PricingPlan>,
    /// The signed-in client's own projects
    pub client_projects: Resource<ClientProject>,
    pub users: Resource<UserAccount>,
    pub contact_messages: Resource<ContactMessage>,
    api: ApiClient,
}

impl Resources {
    pub fn new(api: &ApiClient, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            services: Resource::new(
                api,
                "services",
                endpoints::SERVICES,
                endpoints::SERVICES,
                clock.clone(),
                ttl,
            ),
            projects: Resource::new(
                api,
                "projects",
                endpoints::PROJECTS,
                endpoints::PROJECTS,
                clock.clone(),
                ttl,
            ),
            templates: Resource::new(
                api,
                "templates",
                endpoints::TEMPLATES,
                endpoints::TEMPLATES,
                clock.clone(),
                ttl,
            ),
            pricing: Resource::new(
                api,
                "pricing",
                endpoints::PRICING,
                endpoints::PRICING,
                clock.clone(),
                ttl,
            ),
            client_projects: Resource::new(
                api,
                "client_projects",
                endpoints::MY_PROJECTS,
                endpoints::CLIENT_PROJECTS,
                clock.clone(),
                ttl,
            ),
            users: Resource::new(
                api,
                "users",
                endpoints::USERS,
                endpoints::USERS,
                clock.clone(),
                ttl,
            ),
            contact_messages: Resource::new(
                api,
                "contact_messages",
                endpoints::CONTACT,
                endpoints::CONTACT,
                clock,
                ttl,
            ),
            api: api.clone(),
        }
    }

    /// Drop caches that belong to the signed-in user.
    pub fn invalidate_private(&self) {
        self.client_projects.invalidate();
        self.users.invalidate();
        self.contact_messages.invalidate();
    }

    pub fn invalidate_all(&self) {
        self.services.invalidate();
        self.projects.invalidate();
        self.templates.invalidate();
        self.pricing.invalidate();
        self.invalidate_private();
    }

    /// Public contact form. Validated locally before anything is sent.
    pub async fn submit_contact_message(&self, message: &NewContactMessage) -> Result<()> {
        message
            .validate()
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        let result = self
            .api
            .send_json(Method::POST, endpoints::CONTACT, message)
            .await
            .map(|_| ());
        self.contact_messages.invalidate();
        result
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Agency Portal CLI
//!
//! Restores the persisted session and runs one command against the agency
//! API: `catalog` (default), `login <email> <password>`, `logout`, `whoami`.

use agency_portal::{
    auth::{LoggingNavigator, LoginOutcome},
    cache::CachedCollection,
    config::Config,
    session::FileTokenStore,
    time_utils::format_utc_rfc3339,
    Portal,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(api = %config.api_base_url, "Starting Agency Portal client");

    let store = Arc::new(FileTokenStore::new(config.session_file.clone()));
    let portal = Portal::new(config, store, Arc::new(LoggingNavigator))?;

    let view = portal.session.bootstrap().await;
    tracing::info!(
        authenticated = view.is_authenticated(),
        role = view.role().map(|r| r.as_str()),
        "Session bootstrap complete"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["catalog"] => catalog(&portal).await,
        ["login", email, password] => match portal.session.login(email, password).await {
            LoginOutcome::Authenticated { role, user } => {
                tracing::info!(
                    role = %role,
                    name = user.as_ref().map(|u| u.full_name.as_str()),
                    "Login successful"
                );
            }
            LoginOutcome::Failed { message } => {
                tracing::error!(message = %message, "Login failed");
                std::process::exit(1);
            }
        },
        ["logout"] => portal.logout(),
        ["whoami"] => match portal.session.view().user {
            Some(user) => tracing::info!(
                id = %user.id,
                name = %user.full_name,
                email = %user.email,
                role = %user.role,
                "Signed in"
            ),
            None => tracing::info!("Not signed in"),
        },
        other => {
            tracing::error!(args = ?other, "Unknown command");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn catalog(portal: &Portal) {
    let r = &portal.resources;
    let (services, projects, templates, pricing) = tokio::join!(
        r.services.fetch(),
        r.projects.fetch(),
        r.templates.fetch(),
        r.pricing.fetch()
    );

    report("services", &services);
    report("projects", &projects);
    report("templates", &templates);
    report("pricing", &pricing);
}

fn report<T>(resource: &str, collection: &CachedCollection<T>) {
    let fetched_at = collection
        .last_fetched_at
        .map(format_utc_rfc3339)
        .unwrap_or_default();

    tracing::info!(
        resource,
        count = collection.items.len(),
        status = ?collection.status,
        error = collection.error.as_deref(),
        fetched_at = %fetched_at,
        "Catalog loaded"
    );
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agency_portal=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}

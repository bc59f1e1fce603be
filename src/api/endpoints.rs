//! REST endpoint paths, relative to the API base URL.

use crate::models::EntityId;

pub const LOGIN: &str = "/auth/login";
pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
pub const PROFILE: &str = "/auth/profile";
pub const CHANGE_PASSWORD: &str = "/auth/change-password";
pub const ACCEPT_INVITATION: &str = "/auth/accept-invitation";

pub const SERVICES: &str = "/services";
pub const PROJECTS: &str = "/projects";
pub const TEMPLATES: &str = "/templates";
pub const PRICING: &str = "/pricing";
pub const CLIENT_PROJECTS: &str = "/client-projects";
pub const MY_PROJECTS: &str = "/client-projects/my";
pub const USERS: &str = "/users";
pub const CONTACT: &str = "/contact";

/// Endpoints whose 401 means "bad credentials", never "expired token".
/// Recovering from a 401 on these would recurse into another refresh or
/// replay the credentials.
pub fn is_auth_endpoint(endpoint: &str) -> bool {
    let path = endpoint.split('?').next().unwrap_or(endpoint);
    let path = path.trim_matches('/');
    [LOGIN, REFRESH_TOKEN, ACCEPT_INVITATION]
        .iter()
        .any(|auth| path == auth.trim_start_matches('/'))
}

/// Path of a single entity under a collection.
pub fn item(collection: &str, id: &EntityId) -> String {
    format!("{}/{}", collection, urlencoding::encode(id.as_str()))
}

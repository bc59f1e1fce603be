// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth Session Controller.
//!
//! Owns the Token Store writes for login and logout, restores the session
//! at startup and publishes an `AuthView` projection that guards and UI
//! consumers subscribe to.

use crate::api::{endpoints, ApiClient, RequestOptions};
use crate::error::{ApiError, Result};
use crate::models::{Role, SessionTokens, UserProfile};
use crate::session::{StoredSession, TokenStore};
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use validator::Validate;

/// Where logout sends the user.
pub const LOGIN_ROUTE: &str = "/login";

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Uninitialized,
    Restoring,
    Authenticated(Role),
    Anonymous,
}

/// What the rest of the application sees of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthView {
    pub state: AuthState,
    /// Cached profile; `None` when signed out or the profile call failed
    pub user: Option<UserProfile>,
    /// A login or invitation exchange is in progress
    pub pending: bool,
}

impl AuthView {
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn role(&self) -> Option<Role> {
        match self.state {
            AuthState::Authenticated(role) => Some(role),
            _ => None,
        }
    }

    pub fn loading(&self) -> bool {
        self.pending || self.restoring()
    }

    /// The stored session has not been resolved yet.
    pub fn restoring(&self) -> bool {
        matches!(self.state, AuthState::Uninitialized | AuthState::Restoring)
    }
}

/// Result of a login attempt. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated {
        role: Role,
        user: Option<UserProfile>,
    },
    Failed {
        message: String,
    },
}

/// Navigation side effect performed on logout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator for headless use: records the intent in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "Navigation requested");
    }
}

#[derive(Serialize, Validate)]
struct Credentials {
    #[validate(email(message = "Please enter a valid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PasswordChange {
    #[validate(length(min = 1, message = "Current password is required"))]
    current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    new_password: String,
}

#[derive(Serialize, Validate)]
#[serde(rename_all = "camelCase")]
struct InvitationAcceptance {
    #[validate(length(min = 1, message = "Invitation token is required"))]
    token: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
}

/// Runs on every logout, explicit or forced, before navigation.
pub type LogoutHook = Arc<dyn Fn() + Send + Sync>;

/// Authenticated-identity controller.
pub struct AuthSession {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    view: watch::Sender<AuthView>,
    on_logout: Option<LogoutHook>,
}

impl AuthSession {
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            store,
            navigator,
            view: watch::Sender::new(AuthView::default()),
            on_logout: None,
        }
    }

    /// Register the logout hook, e.g. to drop per-user caches.
    pub fn on_logout(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_logout = Some(Arc::new(hook));
        self
    }

    pub fn view(&self) -> AuthView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthView> {
        self.view.subscribe()
    }

    /// Restore the session from the persisted access token.
    ///
    /// Without a stored token this finishes without any network call. If the
    /// profile call fails and the refresh flow already cleared the store, the
    /// controller logs out. If a token survives the failure (e.g. transient
    /// network error), the persisted role is trusted and the profile is left
    /// unknown; with no persisted role the session stays anonymous but the
    /// stored tokens are kept.
    pub async fn bootstrap(&self) -> AuthView {
        self.set_state(AuthState::Restoring, None);

        let session = self.store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read stored session");
            StoredSession::default()
        });

        if session.access_token.is_none() {
            tracing::info!("No stored session, starting anonymous");
            self.set_state(AuthState::Anonymous, None);
            return self.view();
        }

        match self.fetch_profile().await {
            Ok(profile) => {
                tracing::info!(role = %profile.role, "Session restored");
                self.set_state(AuthState::Authenticated(profile.role), Some(profile));
            }
            Err(e) if self.store.access_token().is_none() => {
                tracing::info!(error = %e, "Stored session is no longer valid, logging out");
                self.logout();
            }
            Err(e) => match session.role {
                Some(role) => {
                    tracing::warn!(
                        error = %e,
                        role = %role,
                        "Profile unavailable, keeping stored session"
                    );
                    self.set_state(AuthState::Authenticated(role), None);
                }
                None => {
                    tracing::warn!(error = %e, "Profile unavailable and no stored role");
                    self.set_state(AuthState::Anonymous, None);
                }
            },
        }

        self.view()
    }

    /// Sign in with email and password.
    ///
    /// On success all three session fields are persisted before the profile
    /// is loaded. A failed profile load still authenticates, with the role
    /// from the login response.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        if let Err(e) = credentials.validate() {
            return LoginOutcome::Failed {
                message: e.to_string(),
            };
        }

        self.set_pending(true);
        let result = self
            .exchange(endpoints::LOGIN, &credentials)
            .await;
        self.finish_sign_in("login", result).await
    }

    /// Accept an emailed invitation, set a password and sign in.
    pub async fn accept_invitation(
        &self,
        token: &str,
        full_name: &str,
        password: &str,
    ) -> LoginOutcome {
        let acceptance = InvitationAcceptance {
            token: token.to_string(),
            full_name: full_name.trim().to_string(),
            password: password.to_string(),
        };
        if let Err(e) = acceptance.validate() {
            return LoginOutcome::Failed {
                message: e.to_string(),
            };
        }

        self.set_pending(true);
        let result = self
            .exchange(endpoints::ACCEPT_INVITATION, &acceptance)
            .await;
        self.finish_sign_in("invitation", result).await
    }

    /// End the session: clear the profile, the Token Store and anything the
    /// logout hook owns, then navigate to the login route.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session store on logout");
        }
        if let Some(hook) = &self.on_logout {
            hook();
        }
        self.view.send_replace(AuthView {
            state: AuthState::Anonymous,
            user: None,
            pending: false,
        });
        tracing::info!("Logged out");
        self.navigator.navigate(LOGIN_ROUTE);
    }

    /// Re-fetch the profile. An expired session logs out.
    pub async fn refresh_profile(&self) -> Result<UserProfile> {
        match self.fetch_profile().await {
            Ok(profile) => {
                self.set_state(AuthState::Authenticated(profile.role), Some(profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                if e.is_session_expired() {
                    self.logout();
                }
                Err(e)
            }
        }
    }

    /// Save profile changes, then re-fetch the stored profile.
    pub async fn update_profile<B: Serialize + ?Sized>(&self, changes: &B) -> Result<UserProfile> {
        if let Err(e) = self
            .api
            .send_json(Method::PUT, endpoints::PROFILE, changes)
            .await
        {
            if e.is_session_expired() {
                self.logout();
            }
            return Err(e);
        }
        self.refresh_profile().await
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        let change = PasswordChange {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        change
            .validate()
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        let result = self
            .api
            .request(endpoints::CHANGE_PASSWORD, RequestOptions::post().json(&change)?)
            .await;

        match result {
            Ok(_) => {
                tracing::info!("Password changed");
                Ok(())
            }
            Err(e) => {
                if e.is_session_expired() {
                    self.logout();
                }
                Err(e)
            }
        }
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.api.get_json(endpoints::PROFILE).await
    }

    async fn exchange<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<SessionTokens> {
        let value = self
            .api
            .send_json(Method::POST, endpoint, body)
            .await?
            .ok_or_else(|| ApiError::Decode(format!("POST {} returned no body", endpoint)))?;

        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("POST {}: {}", endpoint, e)))
    }

    async fn finish_sign_in(
        &self,
        action: &'static str,
        result: Result<SessionTokens>,
    ) -> LoginOutcome {
        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::info!(action, error = %e, "Sign-in rejected");
                self.set_pending(false);
                return LoginOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        if let Err(e) = self.store.save(&tokens) {
            tracing::error!(action, error = %e, "Failed to persist session");
            self.set_pending(false);
            return LoginOutcome::Failed {
                message: e.to_string(),
            };
        }

        let user = match self.fetch_profile().await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(action, error = %e, "Signed in but profile fetch failed");
                None
            }
        };
        let role = user.as_ref().map_or(tokens.role, |u| u.role);

        tracing::info!(action, role = %role, "Signed in");
        self.set_state(AuthState::Authenticated(role), user.clone());

        LoginOutcome::Authenticated { role, user }
    }

    fn set_state(&self, state: AuthState, user: Option<UserProfile>) {
        self.view.send_replace(AuthView {
            state,
            user,
            pending: false,
        });
    }

    fn set_pending(&self, pending: bool) {
        self.view.send_modify(|view| view.pending = pending);
    }
}

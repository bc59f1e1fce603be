//! Route access decisions derived from the auth projection.

use super::controller::AuthView;
use crate::models::Role;

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Session is still being restored; render nothing yet.
    Wait,
    RedirectToLogin,
    /// Signed in, but with the wrong role.
    Deny,
}

pub fn guard(view: &AuthView, access: RouteAccess) -> GuardDecision {
    if access == RouteAccess::Public {
        return GuardDecision::Allow;
    }

    // A pending sign-in does not hide routes the current session may open
    if view.restoring() {
        return GuardDecision::Wait;
    }

    let Some(role) = view.role() else {
        return GuardDecision::RedirectToLogin;
    };

    match access {
        RouteAccess::Role(required) if required != role => GuardDecision::Deny,
        _ => GuardDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;

    fn view(state: AuthState) -> AuthView {
        AuthView {
            state,
            user: None,
            pending: false,
        }
    }

    #[test]
    fn public_routes_always_allowed() {
        assert_eq!(
            guard(&view(AuthState::Restoring), RouteAccess::Public),
            GuardDecision::Allow
        );
    }

    #[test]
    fn restoring_session_waits() {
        assert_eq!(
            guard(&view(AuthState::Restoring), RouteAccess::Authenticated),
            GuardDecision::Wait
        );
        assert_eq!(
            guard(&view(AuthState::Uninitialized), RouteAccess::Role(Role::Admin)),
            GuardDecision::Wait
        );
    }

    #[test]
    fn pending_sign_in_keeps_current_access() {
        let mut signed_in = view(AuthState::Authenticated(Role::Admin));
        signed_in.pending = true;
        assert!(signed_in.loading());
        assert_eq!(
            guard(&signed_in, RouteAccess::Role(Role::Admin)),
            GuardDecision::Allow
        );

        let mut anonymous = view(AuthState::Anonymous);
        anonymous.pending = true;
        assert_eq!(
            guard(&anonymous, RouteAccess::Authenticated),
            GuardDecision::RedirectToLogin
        );
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(
            guard(&view(AuthState::Anonymous), RouteAccess::Authenticated),
            GuardDecision::RedirectToLogin
        );
    }

    #[test]
    fn role_mismatch_is_denied() {
        let client = view(AuthState::Authenticated(Role::Client));
        assert_eq!(
            guard(&client, RouteAccess::Role(Role::Admin)),
            GuardDecision::Deny
        );
        assert_eq!(
            guard(&client, RouteAccess::Role(Role::Client)),
            GuardDecision::Allow
        );
        assert_eq!(
            guard(&client, RouteAccess::Authenticated),
            GuardDecision::Allow
        );
    }
}

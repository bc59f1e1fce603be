// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated-identity lifecycle and route guards.

pub mod controller;
pub mod guard;

pub use controller::{
    AuthSession, AuthState, AuthView, LoggingNavigator, LoginOutcome, LogoutHook, Navigator,
    LOGIN_ROUTE,
};
pub use guard::{guard, GuardDecision, RouteAccess};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted session tokens.

pub mod store;

pub use store::{FileTokenStore, MemoryTokenStore, StoredSession, TokenStore};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the agency REST API.

pub mod client;
pub mod endpoints;
mod refresh;

pub use client::{ApiClient, RequestOptions};

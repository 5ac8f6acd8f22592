// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, page gate, security headers).

pub mod auth;
pub mod page_gate;
pub mod security;

pub use auth::require_auth;
pub use page_gate::page_gate;

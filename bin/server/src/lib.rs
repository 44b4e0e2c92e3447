//! Axum integration for supagate.
//!
//! This crate wires the identity provider into an axum application:
//! refresh-on-expiry middleware, a route guard with public routes, typed
//! extractors, cookie handling and the `/auth/*` endpoints.

pub mod app;
pub mod auth;
pub mod config;


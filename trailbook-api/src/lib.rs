//! # Trailbook API
//!
//! Axum application for the Trailbook tour-booking service: configuration,
//! router, middleware, route handlers, error funnel, and the outbound mail
//! and payment clients. Data models and the generic CRUD store live in
//! `trailbook-shared`.

pub mod app;
pub mod config;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod payments;
pub mod routes;

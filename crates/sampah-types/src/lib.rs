//! Shared types for the waste-collection backend: domain enums, JWT claims,
//! HTTP request/response bodies and display-time handling.

pub mod api;
pub mod models;
pub mod time;

//! Shared building blocks for the query console.
//!
//! Configuration, the error taxonomy, response envelopes, request models
//! and HTTP middleware used by the service crate.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;

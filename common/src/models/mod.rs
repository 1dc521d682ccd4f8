//! Shared data models for the console.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{ConnectionListing, RegisterConnectionRequest, RegistryState};
pub use query::{FetchForm, QueryRequest, QueryResult, QueryResultRow};

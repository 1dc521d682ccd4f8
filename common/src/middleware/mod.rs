//! HTTP middleware shared by the console routes.

pub mod auth;
pub mod request_id;

// Re-export commonly used types
pub use auth::{admin_gate_middleware, AdminGate, SharedAdminGate, SharedSecretGate};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};

//! Backend core for small-business credit applications: a role-aware status
//! workflow (draft through approval) with field-level validation and access
//! policy, exposed behind storage traits and a thin HTTP router.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

//! Terraform provider for Saviynt job control triggers.
//!
//! # Module Structure
//!
//! - [`config`] - Provider settings resolution and retry policy
//! - [`saviynt`] - Authenticated REST client for the Saviynt API
//! - [`jobs`] - Job trigger model, validation and lifecycle
//! - [`provider`] - Terraform plugin protocol bindings

pub mod config;
pub mod jobs;
pub mod provider;
pub mod saviynt;

/// Version injected at compile time via SAVIYNT_PROVIDER_VERSION (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("SAVIYNT_PROVIDER_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

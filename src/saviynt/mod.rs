//! Saviynt API interaction module
//!
//! This module provides the core functionality for interacting with the
//! Saviynt EIC REST API, including authentication, the HTTP transport and the
//! per-domain calls.
//!
//! # Module Structure
//!
//! - [`auth`] - Login and bearer token caching
//! - [`client`] - Main client and the authenticated retry wrapper
//! - [`error`] - Error taxonomy for transport, HTTP and vendor failures
//! - [`http`] - HTTP utilities for REST API calls
//! - [`job_control`] - Trigger create/update/delete
//! - [`entitlements`] - Read-only entitlement lookups
//!
//! # Example
//!
//! ```ignore
//! use saviynt_provider::saviynt::client::SaviyntClient;
//!
//! async fn example(settings: &ProviderSettings) -> anyhow::Result<()> {
//!     let client = SaviyntClient::new(settings)?;
//!     let response = client.create_or_update_triggers(&request).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod entitlements;
pub mod error;
pub mod http;
pub mod job_control;

pub use client::SaviyntClient;
pub use error::{ApiError, ApiResult};

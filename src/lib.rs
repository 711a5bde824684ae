//! tourbook - a typed client for the tour-booking REST API.
//!
//! The crate is split into:
//! - [`api`]: the configured HTTP client, token storage and typed endpoints
//! - [`session`]: the authenticated session built on top of the client
//! - [`catalog`]: local narrowing of tour lists
//! - [`config`], [`logging`], [`error`]: application plumbing
//! - [`cli`]: the terminal front end

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError};
pub use session::Session;

//! `hearth-core` — shared configuration and error types for the Hearth hub.
//!
//! Everything here is policy-free plumbing: the [`config::HubConfig`] tree
//! (TOML file + `HEARTH_*` env overrides via figment) and the top-level
//! [`error::HubError`] used at crate boundaries.

pub mod config;
pub mod error;

pub use config::HubConfig;
pub use error::{HubError, Result};

//! # Beamline Domain
//!
//! Shared domain types for the Beamline dashboard gateway.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures consumed by the gateway and client runtimes
//! - Provider constants (authorize/token endpoints, default scopes)
//!
//! ## Architecture
//! - No dependencies on other Beamline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use config::{Environment, OAuthSettings, ServerSettings, Settings};
pub use errors::{BeamlineError, Result};

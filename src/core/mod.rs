//! Core module - process configuration and its error type
//!
//! - [`ServerConfig`] / [`MatchConfig`] - layered defaults, JSON file and env overrides
//! - [`CoreError`] - what can go wrong while loading them

pub mod config;
pub mod error;

pub use config::{MatchConfig, ServerConfig};
pub use error::{CoreError, CoreResult};

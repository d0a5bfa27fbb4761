//! Domain layer for the vectorcase retrieval core
//!
//! This module contains the domain models, error taxonomy and the port
//! traits that external services are reached through.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, ProviderError};

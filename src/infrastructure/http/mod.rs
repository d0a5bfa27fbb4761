//! HTTP plumbing shared by the provider adapters.

pub mod client;
pub mod retry;

pub use client::{build_client, expect_success, read_json, resolve_api_key, transport_error};
pub use retry::RetryPolicy;

//! Configuration module
//!
//! Handles CLI configuration including the api URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Lectern api
    pub api_url: String,
}

//! Worker configuration
//!
//! Defines the bind address, callback target, concurrency limit and
//! collaborator settings. Callback settings may be missing at startup; the
//! health endpoint reports them until they are provided.

use std::time::Duration;

use lectern_storage::StoreKind;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Full callback URL on the api (e.g., "http://localhost:8080/callback")
    pub callback_url: Option<String>,

    /// Secret shared with the api for callback signatures
    pub callback_secret: Option<String>,

    /// Max jobs processed at the same time; the rest wait for a slot
    pub max_parallel_jobs: usize,

    /// Vision-model gateway; the offline transformer is used when unset
    pub transformer_url: Option<String>,

    /// Upper bound on a single transformation call
    pub transform_timeout: Duration,

    /// Where inputs are read and artifacts written
    pub artifact_store: StoreKind,

    /// Lifetime of presigned artifact URLs
    pub presign_ttl: Duration,

    /// Per-attempt callback timeout
    pub callback_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
            callback_url: None,
            callback_secret: None,
            max_parallel_jobs: 2,
            transformer_url: None,
            transform_timeout: Duration::from_secs(300),
            artifact_store: StoreKind::Memory,
            presign_ttl: Duration::from_secs(24 * 60 * 60),
            callback_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - WORKER_BIND_ADDR (default: 0.0.0.0:8081)
    /// - WORKER_CALLBACK_URL
    /// - WORKER_CALLBACK_SECRET
    /// - WORKER_MAX_PARALLEL_JOBS (default: 2)
    /// - TRANSFORMER_URL
    /// - TRANSFORM_TIMEOUT_SECS (default: 300)
    /// - ARTIFACT_STORE (memory|local:<path>|s3:<bucket>, default: memory)
    /// - PRESIGN_TTL_SECS (default: 86400)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new();

        if let Ok(addr) = std::env::var("WORKER_BIND_ADDR") {
            config.bind_addr = addr;
        }

        config.callback_url = non_empty_var("WORKER_CALLBACK_URL");
        config.callback_secret = non_empty_var("WORKER_CALLBACK_SECRET");
        config.transformer_url = non_empty_var("TRANSFORMER_URL");

        if let Some(n) = std::env::var("WORKER_MAX_PARALLEL_JOBS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.max_parallel_jobs = n;
        }

        if let Some(secs) = std::env::var("TRANSFORM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.transform_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = std::env::var("PRESIGN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.presign_ttl = Duration::from_secs(secs);
        }

        if let Ok(store) = std::env::var("ARTIFACT_STORE") {
            config.artifact_store = store
                .parse()
                .map_err(|e| anyhow::anyhow!("ARTIFACT_STORE: {}", e))?;
        }

        Ok(config)
    }

    /// Settings the worker cannot report outcomes without
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.callback_url.is_none() {
            missing.push("WORKER_CALLBACK_URL");
        }
        if self.callback_secret.is_none() {
            missing.push("WORKER_CALLBACK_SECRET");
        }
        missing
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        if let Some(url) = &self.callback_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("callback_url must start with http:// or https://");
            }
        }

        if self.presign_ttl.is_zero() {
            anyhow::bail!("presign_ttl must be greater than 0");
        }

        if self.transform_timeout.is_zero() {
            anyhow::bail!("transform_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

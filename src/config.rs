use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub social: SocialConfig,

    #[command(flatten)]
    pub session: SessionConfig,

    #[command(flatten)]
    pub cleanup: CleanupConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PAGEDASH_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PAGEDASH_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Management port for liveness/readiness probes
    #[arg(long, env = "PAGEDASH_MGMT_PORT", default_value_t = 3001)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks during shutdown
    #[arg(long, env = "PAGEDASH_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "PAGEDASH_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct StoreConfig {
    /// Base URL of the hosted backend (database + identity provider)
    #[arg(long, env = "PAGEDASH_STORE_URL")]
    pub url: String,

    /// Public (anonymous) API key for the store
    #[arg(long, env = "PAGEDASH_STORE_ANON_KEY")]
    pub anon_key: String,

    /// Privileged service-role key, required for the cleanup sweep
    #[arg(long, env = "PAGEDASH_STORE_SERVICE_KEY")]
    pub service_key: String,

    /// Secret used to verify store-issued access tokens
    #[arg(long, env = "PAGEDASH_STORE_JWT_SECRET")]
    pub jwt_secret: String,

    /// Per-request timeout against the store in milliseconds
    #[arg(long, env = "PAGEDASH_STORE_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct SocialConfig {
    /// Facebook application id. Checked per request, not at boot.
    #[arg(long, env = "PAGEDASH_FACEBOOK_APP_ID")]
    pub app_id: Option<String>,

    /// Facebook application secret. Checked per request, not at boot.
    #[arg(long, env = "PAGEDASH_FACEBOOK_APP_SECRET")]
    pub app_secret: Option<String>,

    /// Pre-registered OAuth callback URL; must byte-match the app settings
    #[arg(
        long,
        env = "PAGEDASH_OAUTH_REDIRECT_URI",
        default_value = "https://app.pagedash.io/oauth/callback"
    )]
    pub redirect_uri: String,

    /// Graph API base URL (overridable for tests)
    #[arg(long, env = "PAGEDASH_GRAPH_BASE_URL", default_value = "https://graph.facebook.com/v19.0")]
    pub graph_base_url: String,

    /// Bound on the code exchange and resource calls in seconds
    #[arg(long, env = "PAGEDASH_EXCHANGE_TIMEOUT_SECS", default_value_t = 10)]
    pub exchange_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct SessionConfig {
    /// Wall-clock ceiling for the post-redirect session lookup in milliseconds
    #[arg(long, env = "PAGEDASH_SESSION_RETRY_MAX_ELAPSED_MS", default_value_t = 5000)]
    pub retry_max_elapsed_ms: u64,

    /// Base delay between session lookup attempts in milliseconds
    #[arg(long, env = "PAGEDASH_SESSION_RETRY_INITIAL_DELAY_MS", default_value_t = 250)]
    pub retry_initial_delay_ms: u64,

    /// Timeout for a single session lookup attempt in milliseconds
    #[arg(long, env = "PAGEDASH_SESSION_ATTEMPT_TIMEOUT_MS", default_value_t = 3000)]
    pub attempt_timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct CleanupConfig {
    /// How often the in-process session sweep runs; 0 disables it and leaves
    /// cleanup to the external scheduler hitting the maintenance endpoint
    #[arg(long, env = "PAGEDASH_CLEANUP_INTERVAL_SECS", default_value_t = 0)]
    pub interval_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "PAGEDASH_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "PAGEDASH_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for the OAuth exchange endpoint
    #[arg(long, env = "PAGEDASH_EXCHANGE_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub exchange_per_second: u32,

    /// Burst allowance for the OAuth exchange endpoint
    #[arg(long, env = "PAGEDASH_EXCHANGE_RATE_LIMIT_BURST", default_value_t = 5)]
    pub exchange_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP endpoint for traces and metrics; unset disables export
    #[arg(long, env = "PAGEDASH_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "PAGEDASH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    #[must_use]
    pub const fn session_retry_max_elapsed(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.session.retry_max_elapsed_ms)
    }

    #[must_use]
    pub const fn session_retry_initial_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.session.retry_initial_delay_ms)
    }

    #[must_use]
    pub const fn session_attempt_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.session.attempt_timeout_ms)
    }
}

use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GRAPH_API_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 2;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 10;

fn default_user_agent() -> String {
    format!("cockpit-ingest/{}", env!("CARGO_PKG_VERSION"))
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub http: HttpConfig,
    pub mailbox: MailboxApiConfig,
    pub database: DatabaseConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `COCKPIT_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("COCKPIT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            http: HttpConfig::from_env_profiled(p),
            mailbox: MailboxApiConfig::from_env_profiled(p),
            database: DatabaseConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs. Holds no secrets.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  http:      timeout={}s, user_agent={}", self.http.timeout_secs, self.http.user_agent);
        tracing::info!("  mailbox:   graph={}, gmail={}", self.mailbox.graph_api_url, self.mailbox.gmail_api_url);
        tracing::info!(
            "  database:  max_connections={}, timeout={}s",
            self.database.max_connections,
            self.database.connect_timeout_secs
        );
    }
}

// ── HTTP client ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout. There is no retry on top of it.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            timeout_secs: profiled_env_u64(p, "COCKPIT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: profiled_env_or(p, "COCKPIT_USER_AGENT", &default_user_agent()),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }
}

// ── Mailbox providers ─────────────────────────────────────────

/// Base URLs of the mailbox provider APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxApiConfig {
    /// Microsoft Graph root, e.g. `https://graph.microsoft.com/v1.0`.
    pub graph_api_url: String,
    /// Gmail REST root, e.g. `https://gmail.googleapis.com/gmail/v1`.
    pub gmail_api_url: String,
}

impl MailboxApiConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            graph_api_url: trim_slash(profiled_env_or(p, "GRAPH_API_URL", DEFAULT_GRAPH_API_URL)),
            gmail_api_url: trim_slash(profiled_env_or(p, "GMAIL_API_URL", DEFAULT_GMAIL_API_URL)),
        }
    }
}

impl Default for MailboxApiConfig {
    fn default() -> Self {
        Self {
            graph_api_url: DEFAULT_GRAPH_API_URL.to_string(),
            gmail_api_url: DEFAULT_GMAIL_API_URL.to_string(),
        }
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

// ── Database ──────────────────────────────────────────────────

/// Pool settings for read-only database sources. The connection string
/// itself comes from each source descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_connections: profiled_env_u32(p, "COCKPIT_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            connect_timeout_secs: profiled_env_u64(p, "COCKPIT_DB_TIMEOUT_SECS", DEFAULT_DB_TIMEOUT_SECS),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DB_TIMEOUT_SECS,
        }
    }
}

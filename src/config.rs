//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Secrets are injected as
//! environment variables by the deployment, so nothing is fetched at runtime.

use std::env;
use std::path::PathBuf;

/// Default SendGrid API origin
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL, used for CORS and cookie security
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Firebase project whose ID tokens are accepted
    pub firebase_project_id: String,
    /// Server port
    pub port: u16,
    /// "production" or anything else
    pub app_env: String,
    /// Directory holding the built frontend, served as the fallback route
    pub static_dir: Option<PathBuf>,
    /// Use the in-memory store instead of Firestore
    pub memory_store: bool,

    // --- Email relay ---
    /// Sender address when a request does not supply one
    pub email_from: String,
    /// SendGrid API origin (overridable for tests)
    pub sendgrid_api_url: String,
    /// Sends allowed per client per window
    pub email_quota_per_window: u32,
    /// Quota window length
    pub email_quota_window_secs: u64,

    // --- Secrets ---
    /// HS256 signing key for session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// SendGrid API key; without one email is logged instead of sent
    pub sendgrid_api_key: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            firebase_project_id: "test-project".to_string(),
            port: 8080,
            app_env: "test".to_string(),
            static_dir: None,
            memory_store: true,
            email_from: "noreply@social-plan.app".to_string(),
            sendgrid_api_url: SENDGRID_API_URL.to_string(),
            email_quota_per_window: 5,
            email_quota_window_secs: 3600,
            session_signing_key: b"test_session_key_32_bytes_min!!!".to_vec(),
            sendgrid_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .unwrap_or_else(|_| gcp_project_id.clone()),
            gcp_project_id,
            port: parse_or("PORT", 8080)?,
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            static_dir: env::var("STATIC_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            memory_store: env::var("STORE")
                .map(|v| v.eq_ignore_ascii_case("memory"))
                .unwrap_or(false),

            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@social-plan.app".to_string()),
            sendgrid_api_url: env::var("SENDGRID_API_URL")
                .unwrap_or_else(|_| SENDGRID_API_URL.to_string()),
            email_quota_per_window: parse_or("EMAIL_QUOTA_PER_WINDOW", 5)?,
            email_quota_window_secs: parse_or("EMAIL_QUOTA_WINDOW_SECS", 3600)?,

            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            sendgrid_api_key: env::var("SENDGRID_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("SESSION_SIGNING_KEY", "test_session_key_32_bytes_min!!!");
        env::set_var("GCP_PROJECT_ID", "planner-test");
        env::remove_var("FIREBASE_PROJECT_ID");
        env::remove_var("SENDGRID_API_KEY");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.gcp_project_id, "planner-test");
        assert_eq!(config.firebase_project_id, "planner-test");
        assert_eq!(config.email_quota_per_window, 5);
        assert_eq!(config.email_quota_window_secs, 3600);
        assert!(config.sendgrid_api_key.is_none());
    }

    #[test]
    fn test_secure_cookies_follow_frontend_scheme() {
        let mut config = Config::default();
        assert!(!config.secure_cookies());
        config.frontend_url = "https://planner.example.com".to_string();
        assert!(config.secure_cookies());
    }
}

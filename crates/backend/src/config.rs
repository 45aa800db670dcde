//! Process configuration, read once at startup and immutable afterwards.

use std::time::Duration;

use thiserror::Error;

use crate::auth::allowlist::Allowlist;
use crate::auth::credentials::CredentialTable;
use crate::auth::google::DEFAULT_TOKENINFO_URL;

pub const DEFAULT_FLIPBOOK_URL: &str = "https://online.fliphtml5.com/gfqeu/wswt/";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_FRONTEND_DIR: &str = "public";

/// Signing secrets that shipped as fallbacks and must never be used.
const PLACEHOLDER_SECRETS: [&str; 4] = [
    "fallback-secret",
    "default-secret-key",
    "secret",
    "changeme",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("JWT_SECRET is a well-known placeholder; set a real signing secret")]
    PlaceholderSecret,

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Gate configuration loaded from environment
#[derive(Clone)]
pub struct GateConfig {
    pub jwt_secret: String,
    pub google_client_id: String,
    pub allowlist: Allowlist,
    pub local_users: CredentialTable,
    pub flipbook_url: String,
    pub tokeninfo_url: String,
    pub verify_timeout: Duration,
    pub port: u16,
    /// `None` allows any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub frontend_dir: String,
}

impl GateConfig {
    /// Configuration with the required values and defaults for everything else.
    /// The local credential table starts empty.
    pub fn new(jwt_secret: &str, google_client_id: &str, allowlist: Allowlist) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            google_client_id: google_client_id.to_string(),
            allowlist,
            local_users: CredentialTable::default(),
            flipbook_url: DEFAULT_FLIPBOOK_URL.to_string(),
            tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
            verify_timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECS),
            port: DEFAULT_PORT,
            cors_allowed_origins: None,
            frontend_dir: DEFAULT_FRONTEND_DIR.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET`: Secret key for signing session tokens
    /// - `GOOGLE_CLIENT_ID`: Expected audience of Google ID tokens
    /// - `ALLOWED_EMAILS`: Comma-separated `email` or `email=Display Name` entries
    ///
    /// Optional: `FLIPBOOK_URL`, `LOCAL_USERS`, `GOOGLE_TOKENINFO_URL`,
    /// `GOOGLE_VERIFY_TIMEOUT_SECS`, `PORT`, `CORS_ALLOWED_ORIGINS`, `FRONTEND_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(value)
        };
        let optional = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = required("JWT_SECRET")?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }

        let google_client_id = required("GOOGLE_CLIENT_ID")?;

        let allowlist = Allowlist::parse(&required("ALLOWED_EMAILS")?);
        if allowlist.is_empty() {
            return Err(ConfigError::Empty("ALLOWED_EMAILS"));
        }

        let mut config = Self::new(&jwt_secret, &google_client_id, allowlist);

        config.local_users = match optional("LOCAL_USERS") {
            Some(raw) => CredentialTable::from_json(&raw).map_err(|e| ConfigError::Invalid {
                name: "LOCAL_USERS",
                reason: e.to_string(),
            })?,
            None => CredentialTable::demo(),
        };

        if let Some(url) = optional("FLIPBOOK_URL") {
            config.flipbook_url = url;
        }
        if let Some(url) = optional("GOOGLE_TOKENINFO_URL") {
            config.tokeninfo_url = url;
        }
        if let Some(secs) = optional("GOOGLE_VERIFY_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| ConfigError::Invalid {
                name: "GOOGLE_VERIFY_TIMEOUT_SECS",
                reason: "must be a whole number of seconds".to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "GOOGLE_VERIFY_TIMEOUT_SECS",
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.verify_timeout = Duration::from_secs(secs);
        }
        if let Some(port) = optional("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: "must be a valid port number".to_string(),
            })?;
        }
        config.cors_allowed_origins = optional("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });
        if let Some(dir) = optional("FRONTEND_DIR") {
            config.frontend_dir = dir;
        }

        Ok(config)
    }

    /// Log configuration choices that are insecure but allowed.
    pub fn warn_insecure(&self) {
        let plaintext = self.local_users.plaintext_count();
        if plaintext > 0 {
            tracing::warn!(
                "{} local account(s) use plaintext passwords; store Argon2 hashes in LOCAL_USERS instead",
                plaintext
            );
        }
        if self.jwt_secret.len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than 32 bytes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("JWT_SECRET", "a-long-enough-secret-for-hmac-signing"),
        ("GOOGLE_CLIENT_ID", "client-123"),
        ("ALLOWED_EMAILS", "Demo@Gmail.com=Demo User, user1@gmail.com"),
    ];

    #[test]
    fn test_minimal_config() {
        let config = GateConfig::from_lookup(lookup(&BASE)).expect("should load");
        assert_eq!(config.google_client_id, "client-123");
        assert!(config.allowlist.is_allowed("demo@gmail.com"));
        assert_eq!(config.allowlist.len(), 2);
        assert_eq!(config.flipbook_url, DEFAULT_FLIPBOOK_URL);
        assert_eq!(config.tokeninfo_url, DEFAULT_TOKENINFO_URL);
        assert_eq!(config.verify_timeout, Duration::from_secs(5));
        assert_eq!(config.port, 3000);
        assert!(config.cors_allowed_origins.is_none());
        // Demo accounts when LOCAL_USERS is unset
        assert!(config.local_users.authenticate("demo@gmail.com", "password123").is_some());
    }

    #[test]
    fn test_missing_secret_fails() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "JWT_SECRET").collect();
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn test_missing_client_id_fails() {
        let vars: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "GOOGLE_CLIENT_ID")
            .collect();
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing("GOOGLE_CLIENT_ID"))
        ));
    }

    #[test]
    fn test_missing_allowlist_fails() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "ALLOWED_EMAILS").collect();
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing("ALLOWED_EMAILS"))
        ));

        let mut vars = BASE.to_vec();
        vars[2] = ("ALLOWED_EMAILS", "");
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Empty("ALLOWED_EMAILS"))
        ));
    }

    #[test]
    fn test_placeholder_secret_fails() {
        for placeholder in ["fallback-secret", "default-secret-key"] {
            let mut vars = BASE.to_vec();
            vars[0] = ("JWT_SECRET", placeholder);
            assert!(matches!(
                GateConfig::from_lookup(lookup(&vars)),
                Err(ConfigError::PlaceholderSecret)
            ));
        }
    }

    #[test]
    fn test_blank_secret_fails() {
        let mut vars = BASE.to_vec();
        vars[0] = ("JWT_SECRET", "   ");
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Empty("JWT_SECRET"))
        ));
    }

    #[test]
    fn test_allowlist_of_only_separators_fails() {
        let mut vars = BASE.to_vec();
        vars[2] = ("ALLOWED_EMAILS", " , ,");
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Empty("ALLOWED_EMAILS"))
        ));
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = BASE.to_vec();
        vars.extend([
            ("FLIPBOOK_URL", "https://books.example.com/1"),
            ("GOOGLE_VERIFY_TIMEOUT_SECS", "2"),
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example.com, https://b.example.com"),
            (
                "LOCAL_USERS",
                r#"[{"id":9,"email":"reader@example.com","password":"pw","name":"Reader"}]"#,
            ),
        ]);
        let config = GateConfig::from_lookup(lookup(&vars)).expect("should load");
        assert_eq!(config.flipbook_url, "https://books.example.com/1");
        assert_eq!(config.verify_timeout, Duration::from_secs(2));
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string()
            ])
        );
        assert_eq!(config.local_users.len(), 1);
        assert!(config.local_users.authenticate("demo@gmail.com", "password123").is_none());
    }

    #[test]
    fn test_invalid_numbers_fail() {
        let mut vars = BASE.to_vec();
        vars.push(("GOOGLE_VERIFY_TIMEOUT_SECS", "0"));
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "GOOGLE_VERIFY_TIMEOUT_SECS", .. })
        ));

        let mut vars = BASE.to_vec();
        vars.push(("PORT", "http"));
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_bad_local_users_json_fails() {
        let mut vars = BASE.to_vec();
        vars.push(("LOCAL_USERS", "not json"));
        assert!(matches!(
            GateConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "LOCAL_USERS", .. })
        ));
    }
}

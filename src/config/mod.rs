use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub schema: SchemaConfig,
    pub security: SecurityConfig,
    pub guard: GuardConfig,
    pub ops: OpsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Path to the declarative schema document loaded at startup
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// Hex-encoded SHA-256 digest of the accepted API key, if key access is enabled
    pub api_key_digest: Option<String>,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Path prefixes that require a resolved session
    pub protected_prefixes: Vec<String>,
    /// Path prefixes of the login/signup surface, redirected away once a session exists
    pub auth_only_prefixes: Vec<String>,
    /// Where unauthenticated requests to protected paths are sent
    pub auth_path: String,
    /// Default destination for already-authenticated requests to the auth surface
    pub home_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    /// Deadline for a single custom-operation handler invocation
    pub handler_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Schema overrides
        if let Ok(v) = env::var("WARDEN_SCHEMA_PATH") {
            self.schema.path = v;
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("WARDEN_API_KEY_DIGEST") {
            self.security.api_key_digest = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Guard overrides
        if let Ok(v) = env::var("GUARD_PROTECTED_PREFIXES") {
            self.guard.protected_prefixes = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("GUARD_AUTH_ONLY_PREFIXES") {
            self.guard.auth_only_prefixes = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("GUARD_AUTH_PATH") {
            self.guard.auth_path = v;
        }
        if let Ok(v) = env::var("GUARD_HOME_PATH") {
            self.guard.home_path = v;
        }

        // Ops overrides
        if let Ok(v) = env::var("OPS_HANDLER_TIMEOUT_MS") {
            self.ops.handler_timeout_ms = v.parse().unwrap_or(self.ops.handler_timeout_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            schema: SchemaConfig {
                path: "schema.yaml".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                // SHA-256 of "dev-api-key"
                api_key_digest: Some(
                    "6e1e4e1b8f8b36d08901cdb51b97841dfe20f5efd2fd2fd00768971408c46274".to_string(),
                ),
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            guard: GuardConfig {
                protected_prefixes: vec![
                    "/dashboard".to_string(),
                    "/admin".to_string(),
                    "/account".to_string(),
                ],
                auth_only_prefixes: vec!["/auth".to_string()],
                auth_path: "/auth/login".to_string(),
                home_path: "/dashboard".to_string(),
            },
            ops: OpsConfig {
                handler_timeout_ms: 30_000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            schema: SchemaConfig {
                path: "schema.yaml".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                api_key_digest: None,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_expiry_hours: 24,
            },
            guard: GuardConfig {
                protected_prefixes: vec![
                    "/dashboard".to_string(),
                    "/admin".to_string(),
                    "/account".to_string(),
                ],
                auth_only_prefixes: vec!["/auth".to_string()],
                auth_path: "/auth/login".to_string(),
                home_path: "/dashboard".to_string(),
            },
            ops: OpsConfig {
                handler_timeout_ms: 15_000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            schema: SchemaConfig {
                path: "schema.yaml".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                api_key_digest: None,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_expiry_hours: 4,
            },
            guard: GuardConfig {
                protected_prefixes: vec![
                    "/dashboard".to_string(),
                    "/admin".to_string(),
                    "/account".to_string(),
                ],
                auth_only_prefixes: vec!["/auth".to_string()],
                auth_path: "/auth/login".to_string(),
                home_path: "/dashboard".to_string(),
            },
            ops: OpsConfig {
                handler_timeout_ms: 10_000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

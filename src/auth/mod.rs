use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config;

/// Identity token claims supplied by the external identity collaborator
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: String, email: Option<String>, groups: Vec<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            email,
            groups,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// How the request authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Verified identity token: a real user session
    Token,
    /// Shared API key: public-key access, not a user session
    ApiKey,
}

/// Request-scoped identity context. Built per request from the transport
/// credentials, never persisted, dropped at request end. Anonymous requests
/// carry no Session at all.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub subject: String,
    pub email: Option<String>,
    pub groups: Vec<String>,
    pub auth: AuthMethod,
}

impl Session {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            groups: claims.groups,
            auth: AuthMethod::Token,
        }
    }

    pub fn api_key() -> Self {
        Self {
            subject: "api-key".to_string(),
            email: None,
            groups: Vec::new(),
            auth: AuthMethod::ApiKey,
        }
    }

    /// True for sessions backed by a verified identity token. API-key access
    /// is deliberately excluded: it matches PublicKey rules only.
    pub fn is_token(&self) -> bool {
        self.auth == AuthMethod::Token
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("JWT secret not configured")]
    MissingSecret,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn verify_jwt(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

/// Check a presented API key against the configured SHA-256 digest. The raw
/// key is never stored or logged.
pub fn verify_api_key(presented: &str) -> Result<(), AuthError> {
    let expected = config::config()
        .security
        .api_key_digest
        .as_deref()
        .ok_or(AuthError::InvalidApiKey)?;

    let digest = Sha256::digest(presented.as_bytes());
    let hex = format!("{:x}", digest);
    if hex.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}

//! Admin authentication: login, HS256 bearer tokens, and the
//! [`AdminSession`] extractor.
//!
//! There is exactly one privileged identity, configured in
//! `auth.admin_username` / `auth.admin_password`. A successful login
//! returns a short-lived signed token whose `sub` claim is that username.
//! Protected handlers take an [`AdminSession`] argument, which rejects the
//! request with `401` unless the `Authorization: Bearer` token verifies
//! and names the admin.

use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use crowdwatch_core::config::AuthConfig;
use crowdwatch_db::OccupancyStore;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Token type reported alongside every issued token.
pub const TOKEN_TYPE: &str = "bearer";

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// JWT claims carried by an admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the admin username.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Body returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed token.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

// ---------------------------------------------------------------------------
// AdminAuth
// ---------------------------------------------------------------------------

/// Credential check plus token signing and verification.
#[derive(Clone)]
pub struct AdminAuth {
    username: String,
    password: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAuth")
            .field("username", &self.username)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl AdminAuth {
    /// Build from explicit values.
    pub fn new(username: &str, password: &str, secret: &str, ttl_minutes: u32) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(i64::from(ttl_minutes)),
        }
    }

    /// Build from the `auth` config section.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.admin_username,
            &config.admin_password,
            &config.secret_key,
            config.token_ttl_minutes,
        )
    }

    /// Check the credential and issue a token.
    pub fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        if username != self.username || password != self.password {
            tracing::warn!(username, "Rejected admin login");
            return Err(ApiError::InvalidCredentials(String::from("Invalid credentials")));
        }
        let access_token = self.issue(Utc::now())?;
        tracing::info!(username, "Admin logged in");
        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_owned(),
        })
    }

    /// Sign a token for the admin, issued at `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, ApiError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal(String::from("token expiry out of range")))?;
        let claims = Claims {
            sub: self.username.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry, and require the admin subject.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::InvalidCredentials(String::from("Token expired"))
                }
                _ => ApiError::InvalidCredentials(format!("Invalid token: {e}")),
            })?;
        if claims.sub != self.username {
            return Err(ApiError::InvalidCredentials(String::from("Invalid credentials")));
        }
        Ok(claims)
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// A verified admin session, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    /// The verified subject.
    pub subject: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl<S: OccupancyStore> FromRequestParts<Arc<AppState<S>>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError::InvalidCredentials(String::from("Missing bearer token"))
            })?;

        let claims = state.auth.verify(token)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| ApiError::InvalidCredentials(String::from("Invalid token expiry")))?;
        Ok(Self {
            subject: claims.sub,
            expires_at,
        })
    }
}

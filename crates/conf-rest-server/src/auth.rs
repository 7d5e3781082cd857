// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Authentication and authorization

use crate::error::ServerError;
use crate::state::AppState;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use conf_domain_types::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account email
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 keys and token lifetime
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issue a token for `email` valid from `now` for the configured lifetime
    pub fn issue(&self, email: &str, role: Role, now: DateTime<Utc>) -> Result<String, ServerError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: email.to_string(),
            role,
            iat,
            exp: iat.saturating_add(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX)),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServerError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry against `now`
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, ServerError> {
        // expiry is checked against the injected clock, not the system time
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ServerError::Auth("Invalid token".to_string()))?;
        if data.claims.exp <= now.timestamp() {
            return Err(ServerError::Auth("Token expired".to_string()));
        }
        Ok(data.claims)
    }
}

/// Argon2id PHC string for `password`
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))
}

/// Whether `password` matches the stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Validates the bearer token and makes its [`Claims`] available to handlers
/// as an `Extension`.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = match bearer_token(&req) {
        Some(token) => state.keys.validate(token, state.now()),
        None => Err(ServerError::Auth(
            "Missing or invalid authorization header".to_string(),
        )),
    };

    match claims {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// Reject requests whose token carries a role other than `role`
pub async fn require_role(role: Role, req: Request, next: Next) -> Response {
    match req.extensions().get::<Claims>() {
        Some(claims) if claims.role == role => next.run(req).await,
        Some(_) => ServerError::Authorization(format!(
            "Access denied. This account is not an {}.",
            role.noun()
        ))
        .into_response(),
        None => ServerError::Auth("Authentication required".to_string()).into_response(),
    }
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    require_role(Role::Admin, req, next).await
}

pub async fn require_attendee(req: Request, next: Next) -> Response {
    require_role(Role::Attendee, req, next).await
}

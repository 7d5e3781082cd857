// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Account registration and sign-in

use crate::auth::{hash_password, verify_password, Claims, TokenKeys};
use crate::dependencies::Clock;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use conf_domain_types::Role;
use conf_local_db::{Database, UserRecord};
use conf_rest_api_contract::*;
use conf_rest_api_contract::validation::{validate_admin_register_request, validate_user_register_request};
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Account service
pub struct AuthService {
    db: Arc<Database>,
    keys: Arc<TokenKeys>,
    clock: Arc<dyn Clock>,
    admin_invite_code: Option<String>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: Arc::clone(&state.db),
            keys: Arc::clone(&state.keys),
            clock: Arc::clone(&state.clock),
            admin_invite_code: state.config.admin_invite_code.clone(),
        }
    }

    /// Create an attendee account
    pub fn register_user(&self, request: &UserRegisterRequest) -> ServerResult<UserResponse> {
        validate_user_register_request(request)?;
        let email = request.email.trim();
        self.ensure_email_free(email)?;

        let hash = hash_password(&request.password)?;
        let user = self.db.insert_user(request.name.trim(), email, &hash, self.clock.now())?;
        tracing::info!(user_id = user.id, "Registered attendee");

        Ok(UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
        })
    }

    /// Create a staff account, checking the invite code when one is configured
    pub fn register_admin(&self, request: &AdminRegisterRequest) -> ServerResult<AdminResponse> {
        validate_admin_register_request(request)?;
        if let Some(expected) = &self.admin_invite_code {
            if request.validation_code.as_deref().map(str::trim) != Some(expected.as_str()) {
                return Err(ServerError::Authorization("Invalid validation code".to_string()));
            }
        }

        let email = request.email.trim();
        self.ensure_email_free(email)?;

        let hash = hash_password(&request.password)?;
        let admin = self
            .db
            .insert_admin(request.staff_name.trim(), email, &hash, self.clock.now())?;
        tracing::info!(admin_id = admin.id, "Registered staff account");

        Ok(AdminResponse {
            id: admin.id,
            staff_name: admin.staff_name,
            email: admin.email,
            message: "Admin registered successfully".to_string(),
        })
    }

    /// Attendee accounts are checked first, then staff accounts
    pub fn login(&self, request: &LoginRequest) -> ServerResult<LoginResponse> {
        let email = request.email.trim();

        let role = if let Some(user) = self.db.find_user_by_email(email)? {
            verify_password(&request.password, &user.password_hash).then_some(Role::Attendee)
        } else if let Some(admin) = self.db.find_admin_by_email(email)? {
            verify_password(&request.password, &admin.password_hash).then_some(Role::Admin)
        } else {
            None
        };

        let Some(role) = role else {
            tracing::info!("Rejected sign-in attempt");
            return Err(ServerError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        let token = self.keys.issue(email, role, self.clock.now())?;
        tracing::info!(role = %role, "Signed in");
        Ok(LoginResponse { token, role })
    }

    /// Attendee behind a validated token
    pub fn current_user(&self, claims: &Claims) -> ServerResult<UserRecord> {
        self.db
            .find_user_by_email(&claims.sub)?
            .ok_or_else(|| ServerError::Auth("Account no longer exists".to_string()))
    }

    fn ensure_email_free(&self, email: &str) -> ServerResult<()> {
        if self.db.email_taken(email)? {
            return Err(ServerError::Conflict("Email is already registered".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::dependencies::DefaultServerDependencies;

    async fn service(invite: Option<&str>) -> AuthService {
        let config = ServerConfig {
            jwt_secret: Some("secret".to_string()),
            admin_invite_code: invite.map(str::to_string),
            ..Default::default()
        };
        let state = DefaultServerDependencies::new(config).await.unwrap().into_state();
        AuthService::new(&state)
    }

    fn user(email: &str) -> UserRegisterRequest {
        UserRegisterRequest {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    fn admin(email: &str, code: Option<&str>) -> AdminRegisterRequest {
        AdminRegisterRequest {
            staff_name: "Grace".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            validation_code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn email_is_unique_across_account_kinds() {
        let service = service(None).await;
        service.register_user(&user("ada@example.com")).unwrap();

        let err = service.register_admin(&admin("ada@example.com", None)).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        let err = service.register_user(&user("ada@example.com")).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[tokio::test]
    async fn invite_code_must_match_when_configured() {
        let service = service(Some("letmein")).await;
        let err = service.register_admin(&admin("grace@example.com", Some("nope"))).unwrap_err();
        assert!(matches!(err, ServerError::Authorization(_)));
        let err = service.register_admin(&admin("grace@example.com", None)).unwrap_err();
        assert!(matches!(err, ServerError::Authorization(_)));

        let created = service.register_admin(&admin("grace@example.com", Some("letmein"))).unwrap();
        assert_eq!(created.staff_name, "Grace");
    }

    #[tokio::test]
    async fn login_resolves_role() {
        let service = service(None).await;
        service.register_user(&user("ada@example.com")).unwrap();
        service.register_admin(&admin("grace@example.com", None)).unwrap();

        let login = |email: &str, password: &str| {
            service.login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
        };

        assert_eq!(login("ada@example.com", "secret1").unwrap().role, Role::Attendee);
        assert_eq!(login("grace@example.com", "secret1").unwrap().role, Role::Admin);
        assert!(matches!(login("ada@example.com", "wrong"), Err(ServerError::Auth(_))));
        assert!(matches!(login("nobody@example.com", "secret1"), Err(ServerError::Auth(_))));
    }
}

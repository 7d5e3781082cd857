// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Sign-in, sign-out and account creation

use crate::context::Context;
use crate::output::print_json;
use chrono::Utc;
use clap::{Args, ValueEnum};
use conf_domain_types::Role;
use conf_rest_api_contract::{AdminRegisterRequest, LoginRequest, UserRegisterRequest};
use conf_rest_client::{session::ensure_role, AuthState, StoredSession};
use serde_json::json;

/// Account kind a sign-in is expected to produce
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExpectedRole {
    Admin,
    User,
}

impl From<ExpectedRole> for Role {
    fn from(role: ExpectedRole) -> Self {
        match role {
            ExpectedRole::Admin => Role::Admin,
            ExpectedRole::User => Role::Attendee,
        }
    }
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "CONFCTL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Refuse the session unless the account has this role
    #[arg(long, value_enum)]
    pub expect: Option<ExpectedRole>,
}

impl LoginArgs {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let client = ctx.anonymous_client()?;
        let login = client
            .signin(&LoginRequest {
                email: self.email.clone(),
                password: self.password,
            })
            .await?;

        // a mismatch must not leave a session behind
        if let Some(expected) = self.expect {
            ensure_role(login.role, expected.into())?;
        }

        let session = StoredSession::new(login.token, login.role);
        session.save(&ctx.session_path)?;
        tracing::info!(email = %self.email, role = %login.role, "Signed in");

        if ctx.json {
            print_json(&json!({
                "role": login.role,
                "landingPath": login.role.landing_path(),
                "expiresAt": session.expires_at(),
            }))
        } else {
            println!("Logged in as {} ({})", self.email, login.role.normalized());
            println!("Landing page: {}", login.role.landing_path());
            Ok(())
        }
    }
}

pub fn logout(ctx: &Context) -> anyhow::Result<()> {
    StoredSession::clear(&ctx.session_path)?;
    if !ctx.json {
        println!("Logged out");
    }
    Ok(())
}

pub fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let state = AuthState::restore(&ctx.session_path, Utc::now())?;
    let session = state.session();

    if ctx.json {
        return print_json(&json!({
            "loggedIn": session.is_some(),
            "role": session.map(|s| s.role),
            "expiresAt": session.and_then(StoredSession::expires_at),
        }));
    }

    match session {
        Some(session) => {
            println!("Role: {}", session.role.normalized());
            match session.expires_at() {
                Some(at) => println!("Token expires: {}", at.to_rfc3339()),
                None => println!("Token expires: unknown"),
            }
        }
        None => println!("not logged in"),
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "CONFCTL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl RegisterArgs {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let user = ctx
            .anonymous_client()?
            .register_user(&UserRegisterRequest {
                name: self.name,
                email: self.email,
                password: self.password,
            })
            .await?;

        if ctx.json {
            print_json(&user)
        } else {
            println!("Registered {} <{}> (id {})", user.name, user.email, user.id);
            Ok(())
        }
    }
}

#[derive(Args, Debug)]
pub struct AdminRegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "CONFCTL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Invite code, when the server requires one
    #[arg(long, env = "CONFCTL_VALIDATION_CODE", hide_env_values = true)]
    pub validation_code: Option<String>,
}

impl AdminRegisterArgs {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let admin = ctx
            .anonymous_client()?
            .register_admin(&AdminRegisterRequest {
                staff_name: self.name,
                email: self.email,
                password: self.password,
                validation_code: self.validation_code,
            })
            .await?;

        if ctx.json {
            print_json(&admin)
        } else {
            println!("{} (id {})", admin.message, admin.id);
            Ok(())
        }
    }
}

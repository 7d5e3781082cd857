// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Account roles

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Role carried in issued tokens.
///
/// On the wire roles use the authority form (`ROLE_ADMIN`, `ROLE_USER`);
/// [`Role::normalized`] strips the prefix for display and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN", alias = "ADMIN")]
    Admin,
    #[serde(rename = "ROLE_USER", alias = "USER")]
    Attendee,
}

impl Role {
    /// Authority string as issued in tokens and login responses
    pub fn as_authority(self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Attendee => "ROLE_USER",
        }
    }

    /// Role name without the `ROLE_` prefix
    pub fn normalized(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Attendee => "USER",
        }
    }

    /// Where a freshly authenticated account of this role lands
    pub fn landing_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Attendee => "/attendee/dashboard",
        }
    }

    /// Human noun used in access-denied messages
    pub fn noun(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Attendee => "attendee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_authority())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix("ROLE_").unwrap_or(trimmed);
        match name.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" | "ATTENDEE" => Ok(Role::Attendee),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authority_and_normalized_forms() {
        assert_eq!("ROLE_ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("ROLE_USER".parse::<Role>().unwrap(), Role::Attendee);
        assert_eq!("attendee".parse::<Role>().unwrap(), Role::Attendee);
        assert!("ROLE_ROOT".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_as_authority() {
        let json = serde_json::to_string(&Role::Attendee).unwrap();
        assert_eq!(json, "\"ROLE_USER\"");
        let back: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(back, Role::Admin);
    }

    #[test]
    fn landing_paths_follow_role() {
        assert_eq!(Role::Admin.landing_path(), "/admin/dashboard");
        assert_eq!(Role::Attendee.landing_path(), "/attendee/dashboard");
    }

    #[test]
    fn nouns_read_after_an() {
        assert_eq!(format!("not an {}", Role::Admin.noun()), "not an admin");
        assert_eq!(format!("not an {}", Role::Attendee.noun()), "not an attendee");
    }
}

//! User, role, and session models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Closed set of platform roles. Determines default permissions;
/// assigned at registration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Defaults to "student" when omitted.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token half of the register/login envelope. The token itself is only
/// ever returned here; the server stores a hash.
#[derive(Debug, Serialize)]
pub struct Authorisation {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
}

impl Authorisation {
    pub fn bearer(token: String) -> Self {
        Self {
            token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub user: UserResponse,
    pub authorisation: Authorisation,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub status: &'static str,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Student, Role::Teacher, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()), Ok(role));
        }
        assert!(Role::from_str("principal").is_err());
        assert!(Role::from_str("Teacher").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(parsed, Role::Teacher);
    }

    #[test]
    fn user_response_drops_password_hash() {
        let user = User {
            id: 1,
            name: "Jordan".into(),
            email: "jordan@school.test".into(),
            password_hash: "secret-hash".into(),
            role: Role::Teacher,
            created_at: "2024-01-01T00:00:00+00:00".into(),
            updated_at: "2024-01-01T00:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"teacher\""));
    }
}

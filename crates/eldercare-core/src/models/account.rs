//! Account models: guardians, staff, caretakers and sessions.

use serde::{Deserialize, Serialize};

/// Capability role of an authenticated account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
    Caretaker,
    Doctor,
    Guardian,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Caretaker => "caretaker",
            Role::Doctor => "doctor",
            Role::Guardian => "guardian",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "operator" => Some(Role::Operator),
            "caretaker" => Some(Role::Caretaker),
            "doctor" => Some(Role::Doctor),
            "guardian" => Some(Role::Guardian),
            _ => None,
        }
    }

    /// Staff roles are everything except guardian.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Guardian)
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Guardian or staff ID
    pub account_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(account_id: impl Into<String>, role: Role) -> Self {
        Self {
            account_id: account_id.into(),
            role,
        }
    }

    /// Whether this actor is the given account.
    pub fn is(&self, account_id: &str) -> bool {
        self.account_id == account_id
    }
}

/// A guardian (elder's responsible relative).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub id: String,
    pub name: String,
    /// Login email, unique case-insensitively
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl Guardian {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: super::new_id(),
            name,
            email: normalize_email(&email),
            phone: None,
            address: None,
            created_at: super::now(),
        }
    }
}

/// A staff member (admin, operator, caretaker or doctor).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    /// Doctors only
    pub specialization: Option<String>,
    /// Inactive staff cannot log in or receive assignments
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Staff {
    pub fn new(name: String, email: String, role: Role) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            name,
            email: normalize_email(&email),
            role,
            phone: None,
            specialization: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A caretaker's view of their workload. Wraps a staff account 1:1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Caretaker {
    pub staff_id: String,
    /// Deduplicated elder IDs
    pub assigned_elders: Vec<String>,
}

/// Stored password digest for an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub account_id: String,
    pub role: Role,
    pub password_hash: String,
}

/// A persisted login session. Only the token digest is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token_hash: String,
    pub account_id: String,
    pub role: Role,
    pub expires_at: String,
}

/// Canonical form of an email address for uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public guardian sign-up form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewGuardian {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin payload for creating a staff account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// Admin payload for editing a staff account. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// The account behind a session, as returned by `/api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Profile {
    Guardian(Guardian),
    Staff(Staff),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in [
            Role::Admin,
            Role::Operator,
            Role::Caretaker,
            Role::Doctor,
            Role::Guardian,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert!(!Role::Guardian.is_staff());
        assert!(Role::Doctor.is_staff());
    }

    #[test]
    fn test_email_normalized() {
        let guardian = Guardian::new("Ann".into(), "  Ann@Example.COM ".into());
        assert_eq!(guardian.email, "ann@example.com");
    }
}

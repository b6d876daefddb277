//! Eldercare Core Library
//!
//! Records and approval workflows for an elder-care facility.
//!
//! # Architecture
//!
//! ```text
//!  Guardian submits elder ──► [DISABLED_PENDING_REVIEW]
//!                                      │ operator approves (payment opened)
//!                                      ▼
//!                          [APPROVED_AWAITING_PAYMENT] ──► payment confirmed
//!                                      │
//!                                      ▼
//!                               [PAYMENT_SUCCESS] ──► activate ──► [ACTIVE]
//!                                      │
//!                     ┌────────────────┼────────────────┐
//!                     ▼                ▼                ▼
//!                 Caretaker          Room       Meals / Events /
//!                 assignment      assignment     Consultations
//! ```
//!
//! Every status change goes through a workflow service that authorizes
//! the caller, validates the transition against the entity's
//! [`Lifecycle`], persists with a guarded update and hands back the
//! [`Notification`]s the change produced. Delivering those is the
//! caller's job.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Elder, Payment, Room, Consultation, etc.)
//! - [`policy`]: Role table for every resource and action
//! - [`workflow`]: Transition handlers and CRUD services
//! - [`export`]: Admin dashboard and CSV export

pub mod db;
pub mod export;
pub mod models;
pub mod policy;
pub mod workflow;

// Re-export commonly used types
pub use db::{DashboardStats, Database};
pub use models::{
    Actor, Elder, ElderStatus, Lifecycle, Payment, PaymentStatus, Role, Room, RoomStatus,
};
pub use policy::{authorize, Action, Resource};
pub use workflow::{Notification, NotificationKind, Transition};

use thiserror::Error;

/// Errors returned by every workflow operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(db::DbError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(what: &str, id: &str) -> Self {
        CoreError::NotFound(format!("{what} not found: {id}"))
    }

    /// Rejected status change from `from` to `to`.
    pub fn transition<S: Lifecycle>(what: &str, from: S, to: S) -> Self {
        CoreError::InvalidState(format!(
            "{what} cannot move from {} to {}",
            from.as_str(),
            to.as_str()
        ))
    }
}

impl From<db::DbError> for CoreError {
    fn from(e: db::DbError) -> Self {
        if e.is_constraint_violation() {
            CoreError::Conflict(e.to_string())
        } else {
            CoreError::Database(e)
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(e: rusqlite::Error) -> Self {
        db::DbError::from(e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_becomes_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute("INSERT INTO inventory (id, name) VALUES ('i1', 'Soap')", [])
            .unwrap();
        let err: CoreError = db
            .conn()
            .execute("INSERT INTO inventory (id, name) VALUES ('i2', 'SOAP')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_transition_message() {
        let err = CoreError::transition("Elder", ElderStatus::Active, ElderStatus::Rejected);
        assert_eq!(err.to_string(), "Elder cannot move from ACTIVE to REJECTED");
    }
}

//! Workflow services.
//!
//! Each service borrows the [`Database`](crate::db::Database) for the
//! duration of one operation. Status-changing operations follow the same
//! steps: load, authorize, validate the transition, apply, persist with a
//! guarded update, and return a [`Transition`] carrying the notifications
//! the change produced.

mod accounts;
mod care;
mod consultations;
mod donations;
mod elders;
mod rooms;

pub use accounts::*;
pub use care::*;
pub use consultations::*;
pub use donations::*;
pub use elders::*;
pub use rooms::*;

use serde::{Deserialize, Serialize};

use crate::models::Lifecycle;
use crate::{CoreError, CoreResult};

/// What a notification is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    PaymentRequested,
    ElderRejected,
    PaymentReminder,
    PaymentReceived,
    ElderActivated,
    ConsultationDecided,
    DonationThanks,
}

/// An email-like message produced by a transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(kind: NotificationKind, to: &str, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.into(),
            body: body.into(),
            kind,
        }
    }
}

/// Result of a status change: the updated entity and what to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub entity: T,
    pub notifications: Vec<Notification>,
}

impl<T> Transition<T> {
    pub fn quiet(entity: T) -> Self {
        Self {
            entity,
            notifications: Vec::new(),
        }
    }

    pub fn notify(entity: T, notification: Notification) -> Self {
        Self {
            entity,
            notifications: vec![notification],
        }
    }
}

/// Fee and checkout settings for the admission workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub elder_fee: f64,
    pub checkout_base_url: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            elder_fee: 1500.0,
            checkout_base_url: "http://localhost:8080/mock-checkout".to_string(),
        }
    }
}

/// Fail with `InvalidState` unless `from → to` is a legal move.
pub(crate) fn check_transition<S: Lifecycle>(what: &str, from: S, to: S) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::transition(what, from, to))
    }
}

/// A guarded write that touched no row lost a race with another writer.
pub(crate) fn ensure_written(written: bool, what: &str, id: &str) -> CoreResult<()> {
    if written {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "{what} {id} was changed by another request"
        )))
    }
}

/// Trimmed, non-empty text or `BadRequest`.
pub(crate) fn required(value: &str, field: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::BadRequest(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the workflow unit tests.

    use super::*;
    use crate::db::Database;
    use crate::models::{Actor, NewElder, NewGuardian, NewStaff, Role};

    pub const PASSWORD: &str = "correct-horse";

    pub fn guardian(db: &Database, email: &str) -> Actor {
        let guardian = AccountService::new(db)
            .register_guardian(NewGuardian {
                name: "Ann".into(),
                email: email.into(),
                password: PASSWORD.into(),
                phone: None,
                address: None,
            })
            .unwrap();
        Actor::new(guardian.id, Role::Guardian)
    }

    pub fn admin(db: &Database) -> Actor {
        let staff = AccountService::new(db)
            .bootstrap_admin("root@care.org", PASSWORD)
            .unwrap();
        Actor::new(staff.id, Role::Admin)
    }

    pub fn staff(db: &Database, email: &str, role: Role) -> Actor {
        let root = match db.staff_credentials("root@care.org").unwrap() {
            Some(creds) => Actor::new(creds.account_id, Role::Admin),
            None => admin(db),
        };
        let staff = AccountService::new(db)
            .create_staff(
                &root,
                NewStaff {
                    name: email.split('@').next().unwrap_or("staff").into(),
                    email: email.into(),
                    password: PASSWORD.into(),
                    role,
                    phone: None,
                    specialization: None,
                },
            )
            .unwrap();
        Actor::new(staff.id, role)
    }

    pub fn elder_request(name: &str) -> NewElder {
        NewElder {
            full_name: name.into(),
            dob: "1950-01-01".into(),
            gender: Some("female".into()),
            address: Some("12 Elm St".into()),
            medical_notes: Some("none".into()),
        }
    }

    /// An elder submitted, approved, paid and activated.
    pub fn active_elder(db: &Database, guardian: &Actor, name: &str) -> String {
        let settings = WorkflowSettings::default();
        let operator = staff(db, &format!("op-{}@care.org", uuid::Uuid::new_v4()), Role::Operator);
        let elders = ElderService::new(db, &settings);

        let elder = elders.submit(guardian, elder_request(name)).unwrap();
        let approved = elders.approve(&operator, &elder.id).unwrap().entity;
        let payment_id = approved.payment_id.unwrap();
        elders.confirm_payment(guardian, &payment_id, true).unwrap();
        elders.activate(&operator, &elder.id).unwrap();
        elder.id
    }

    /// `active_elder` plus an assigned caretaker.
    pub fn cared_elder(db: &Database, guardian: &Actor, caretaker: &Actor, name: &str) -> String {
        let settings = WorkflowSettings::default();
        let elder_id = active_elder(db, guardian, name);
        let admin = Actor::new(
            db.staff_credentials("root@care.org").unwrap().unwrap().account_id,
            Role::Admin,
        );
        ElderService::new(db, &settings)
            .assign_caretaker(&admin, &elder_id, &caretaker.account_id)
            .unwrap();
        elder_id
    }
}

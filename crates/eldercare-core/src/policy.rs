//! Role-based access table.
//!
//! Every workflow operation first asks [`authorize`] whether the caller's
//! role may perform the action at all. Ownership (the guardian of this
//! elder, the caretaker assigned to it, the doctor addressed by a
//! consultation) is checked afterwards by the operation itself.

use crate::models::{Actor, Role};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Elder,
    Payment,
    Room,
    Meal,
    Event,
    Consultation,
    Appointment,
    Prescription,
    Donation,
    Inventory,
    Staff,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    List,
    /// The caller's own caseload.
    ListAssigned,
    Update,
    Delete,
    Approve,
    Reject,
    Remind,
    Activate,
    Assign,
    Release,
    Enroll,
    Confirm,
    Receive,
    Export,
}

use Action::*;
use Resource::*;
use Role::{Admin, Caretaker, Doctor, Guardian, Operator};

const REVIEWERS: &[Role] = &[Operator, Admin];
const ADMIN: &[Role] = &[Admin];

/// Resource × action → roles allowed.
pub const POLICY: &[(Resource, Action, &[Role])] = &[
    (Elder, Create, &[Guardian]),
    (Elder, Read, &[Guardian, Admin, Operator, Caretaker, Doctor]),
    (Elder, List, REVIEWERS),
    (Elder, ListAssigned, &[Caretaker]),
    (Elder, Delete, &[Guardian]),
    (Elder, Approve, REVIEWERS),
    (Elder, Reject, REVIEWERS),
    (Elder, Remind, REVIEWERS),
    (Elder, Activate, REVIEWERS),
    (Elder, Assign, REVIEWERS),
    (Payment, Create, &[Guardian]),
    (Payment, Read, &[Guardian]),
    (Payment, Confirm, &[Guardian]),
    (Payment, List, REVIEWERS),
    (Room, List, &[Caretaker, Operator, Admin]),
    (Room, Create, ADMIN),
    (Room, Update, ADMIN),
    (Room, Delete, ADMIN),
    (Room, Assign, &[Caretaker, Admin]),
    (Room, Release, &[Caretaker, Admin]),
    (Meal, Create, &[Caretaker, Admin]),
    (Meal, Delete, &[Caretaker, Admin]),
    (Meal, Read, &[Guardian, Caretaker, Admin]),
    (Event, List, &[Guardian, Admin, Operator, Caretaker, Doctor]),
    (Event, Create, ADMIN),
    (Event, Update, ADMIN),
    (Event, Delete, ADMIN),
    (Event, Enroll, &[Caretaker, Admin]),
    (Consultation, Create, &[Caretaker]),
    (Consultation, List, &[Caretaker, Doctor, Admin]),
    (Consultation, Approve, &[Doctor]),
    (Consultation, Reject, &[Doctor]),
    (Appointment, List, &[Doctor, Admin]),
    (Appointment, Update, &[Doctor]),
    (Prescription, Create, &[Doctor]),
    (Prescription, Read, &[Guardian, Caretaker, Doctor, Admin]),
    (Donation, List, ADMIN),
    (Donation, Receive, ADMIN),
    (Inventory, List, ADMIN),
    (Inventory, Create, ADMIN),
    (Inventory, Update, ADMIN),
    (Inventory, Delete, ADMIN),
    (Staff, List, ADMIN),
    (Staff, Create, ADMIN),
    (Staff, Update, ADMIN),
    (Staff, Delete, ADMIN),
    (Dashboard, Read, ADMIN),
    (Dashboard, Export, ADMIN),
];

/// Roles allowed to perform `action` on `resource`. Empty when unlisted.
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    POLICY
        .iter()
        .find(|(r, a, _)| *r == resource && *a == action)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[])
}

/// Fail with `Forbidden` unless the actor's role is listed for the action.
pub fn authorize(actor: &Actor, resource: Resource, action: Action) -> CoreResult<()> {
    if allowed_roles(resource, action).contains(&actor.role) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role {} may not {:?} {:?}",
            actor.role.as_str(),
            action,
            resource
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn staff_only(roles: &[Role]) -> bool {
        roles.iter().all(|r| r.is_staff())
    }

    #[test]
    fn test_no_duplicate_rows() {
        let mut seen = HashSet::new();
        for (resource, action, _) in POLICY {
            assert!(seen.insert((*resource, *action)), "duplicate {resource:?} {action:?}");
        }
    }

    #[test]
    fn test_authorize() {
        let operator = Actor::new("o1", Operator);
        assert!(authorize(&operator, Elder, Approve).is_ok());
        assert!(matches!(
            authorize(&operator, Consultation, Approve),
            Err(CoreError::Forbidden(_))
        ));

        let guardian = Actor::new("g1", Guardian);
        assert!(authorize(&guardian, Elder, Create).is_ok());
        assert!(authorize(&guardian, Room, List).is_err());
        assert!(authorize(&guardian, Elder, ListAssigned).is_err());
        assert!(authorize(&Actor::new("c1", Caretaker), Elder, ListAssigned).is_ok());
    }

    #[test]
    fn test_unlisted_action_denied() {
        assert!(allowed_roles(Donation, Export).is_empty());
        assert!(authorize(&Actor::new("a1", Admin), Donation, Export).is_err());
    }

    #[test]
    fn test_admin_surfaces_are_staff_only() {
        for (resource, _, roles) in POLICY {
            if matches!(resource, Staff | Inventory | Dashboard | Donation | Room) {
                assert!(staff_only(roles), "{resource:?} open to guardians");
            }
        }
    }
}

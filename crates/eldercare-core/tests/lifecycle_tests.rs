//! Property tests for the admission lifecycle.

use eldercare_core::db::Database;
use eldercare_core::models::{NewElder, NewGuardian};
use eldercare_core::workflow::{AccountService, ElderService, WorkflowSettings};
use eldercare_core::{Actor, ElderStatus, Lifecycle, PaymentStatus, Role};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Step {
    Approve,
    Reject,
    PaySuccess,
    PayFail,
    Reopen,
    Remind,
    Activate,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Approve),
        Just(Step::Reject),
        Just(Step::PaySuccess),
        Just(Step::PayFail),
        Just(Step::Reopen),
        Just(Step::Remind),
        Just(Step::Activate),
    ]
}

fn setup() -> (Database, Actor, Actor) {
    let db = Database::open_in_memory().unwrap();
    let accounts = AccountService::new(&db);
    let admin = accounts.bootstrap_admin("root@care.org", "correct-horse").unwrap();
    let guardian = accounts
        .register_guardian(NewGuardian {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password: "correct-horse".into(),
            phone: None,
            address: None,
        })
        .unwrap();
    (
        db,
        Actor::new(admin.id, Role::Admin),
        Actor::new(guardian.id, Role::Guardian),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn elder_status_only_moves_forward(steps in prop::collection::vec(step(), 1..12)) {
        let (db, operator, guardian) = setup();
        let settings = WorkflowSettings::default();
        let elders = ElderService::new(&db, &settings);
        let elder = elders
            .submit(&guardian, NewElder {
                full_name: "Jane".into(),
                dob: "1950-01-01".into(),
                gender: None,
                address: None,
                medical_notes: None,
            })
            .unwrap();

        let mut before = elder.status;
        for step in steps {
            let current = db.get_elder(&elder.id).unwrap().unwrap();
            let result = match step {
                Step::Approve => elders.approve(&operator, &elder.id).map(|_| ()),
                Step::Reject => elders.reject(&operator, &elder.id, "full").map(|_| ()),
                Step::Remind => elders.send_payment_reminder(&operator, &elder.id).map(|_| ()),
                Step::Activate => elders.activate(&operator, &elder.id).map(|_| ()),
                Step::Reopen => elders.reopen_payment(&guardian, &elder.id).map(|_| ()),
                Step::PaySuccess | Step::PayFail => match current.payment_id.as_deref() {
                    Some(id) => elders
                        .confirm_payment(&guardian, id, matches!(step, Step::PaySuccess))
                        .map(|_| ()),
                    None => continue,
                },
            };

            let after = db.get_elder(&elder.id).unwrap().unwrap();
            if result.is_err() {
                prop_assert_eq!(after.status, before);
            } else {
                prop_assert!(after.status == before || before.can_transition_to(after.status),
                    "{:?} -> {:?}", before, after.status);
            }

            if after.status == ElderStatus::Active {
                let payment = db.get_payment(after.payment_id.as_deref().unwrap()).unwrap().unwrap();
                prop_assert_eq!(payment.status, PaymentStatus::Success);
            }
            before = after.status;
        }
    }
}

#[test]
fn test_transitions_follow_the_chain() {
    for from in ElderStatus::ALL {
        for to in ElderStatus::ALL {
            if !from.can_transition_to(*to) {
                continue;
            }
            match (from.rank(), to.rank()) {
                (Some(a), Some(b)) => assert_eq!(b, a + 1, "{from:?} -> {to:?}"),
                (Some(_), None) => assert_eq!(*to, ElderStatus::Rejected),
                (None, _) => panic!("rejected elders cannot move"),
            }
        }
    }
    assert!(ElderStatus::Rejected.is_terminal());
    assert!(ElderStatus::Active.is_terminal());
}

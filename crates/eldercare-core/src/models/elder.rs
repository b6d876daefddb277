//! Elder records and the admission lifecycle.

use serde::{Deserialize, Serialize};

use super::Lifecycle;

/// Admission status of an elder.
///
/// ```text
/// DISABLED_PENDING_REVIEW → APPROVED_AWAITING_PAYMENT → PAYMENT_SUCCESS → ACTIVE
///            │                        │
///            └──────────┬─────────────┘
///                       ▼
///                   REJECTED
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElderStatus {
    /// Submitted by a guardian, waiting for an operator
    DisabledPendingReview,
    /// Operator approved, a payment is open
    ApprovedAwaitingPayment,
    /// Payment confirmed, waiting for activation
    PaymentSuccess,
    /// Resident of the facility
    Active,
    /// Operator rejected the request
    Rejected,
}

impl ElderStatus {
    /// Position along the admission chain. `None` for `Rejected`.
    pub fn rank(&self) -> Option<u8> {
        match self {
            ElderStatus::DisabledPendingReview => Some(0),
            ElderStatus::ApprovedAwaitingPayment => Some(1),
            ElderStatus::PaymentSuccess => Some(2),
            ElderStatus::Active => Some(3),
            ElderStatus::Rejected => None,
        }
    }

    /// Whether the elder has been paid for and can receive care assignments.
    pub fn is_admitted(&self) -> bool {
        matches!(self, ElderStatus::PaymentSuccess | ElderStatus::Active)
    }
}

impl Lifecycle for ElderStatus {
    const ALL: &'static [Self] = &[
        ElderStatus::DisabledPendingReview,
        ElderStatus::ApprovedAwaitingPayment,
        ElderStatus::PaymentSuccess,
        ElderStatus::Active,
        ElderStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ElderStatus::DisabledPendingReview => "DISABLED_PENDING_REVIEW",
            ElderStatus::ApprovedAwaitingPayment => "APPROVED_AWAITING_PAYMENT",
            ElderStatus::PaymentSuccess => "PAYMENT_SUCCESS",
            ElderStatus::Active => "ACTIVE",
            ElderStatus::Rejected => "REJECTED",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        use ElderStatus::*;
        matches!(
            (self, next),
            (DisabledPendingReview, ApprovedAwaitingPayment)
                | (ApprovedAwaitingPayment, PaymentSuccess)
                | (PaymentSuccess, Active)
                | (DisabledPendingReview, Rejected)
                | (ApprovedAwaitingPayment, Rejected)
        )
    }
}

/// An elder (care recipient) record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Elder {
    /// Unique elder ID
    pub id: String,
    /// Full name
    pub full_name: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    /// Owning guardian
    pub guardian_id: String,
    /// Assigned caretaker (staff ID)
    pub caretaker_id: Option<String>,
    /// Admission status
    pub status: ElderStatus,
    /// Current payment, once approved
    pub payment_id: Option<String>,
    /// Set when rejected
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Elder {
    /// Create a freshly submitted elder awaiting review.
    pub fn new(guardian_id: String, request: NewElder) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            full_name: request.full_name.trim().to_string(),
            dob: request.dob,
            gender: request.gender,
            address: request.address,
            medical_notes: request.medical_notes,
            guardian_id,
            caretaker_id: None,
            status: ElderStatus::DisabledPendingReview,
            payment_id: None,
            rejection_reason: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = super::now();
    }
}

/// Guardian submission payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewElder {
    pub full_name: String,
    pub dob: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub medical_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> NewElder {
        NewElder {
            full_name: "  Jane Doe ".into(),
            dob: "1950-01-01".into(),
            gender: Some("female".into()),
            address: Some("12 Elm St".into()),
            medical_notes: Some("none".into()),
        }
    }

    #[test]
    fn test_new_elder_pending_review() {
        let elder = Elder::new("guardian-1".into(), jane());
        assert_eq!(elder.full_name, "Jane Doe");
        assert_eq!(elder.status, ElderStatus::DisabledPendingReview);
        assert!(elder.caretaker_id.is_none());
        assert_eq!(elder.id.len(), 36);
    }

    #[test]
    fn test_chain_transitions() {
        use ElderStatus::*;
        assert!(DisabledPendingReview.can_transition_to(ApprovedAwaitingPayment));
        assert!(ApprovedAwaitingPayment.can_transition_to(PaymentSuccess));
        assert!(PaymentSuccess.can_transition_to(Active));

        // No skipping ahead or going back
        assert!(!DisabledPendingReview.can_transition_to(Active));
        assert!(!Active.can_transition_to(DisabledPendingReview));
        assert!(!PaymentSuccess.can_transition_to(Rejected));
    }

    #[test]
    fn test_rejected_and_active_are_terminal() {
        assert!(ElderStatus::Rejected.is_terminal());
        assert!(ElderStatus::Active.is_terminal());
        assert!(!ElderStatus::DisabledPendingReview.is_terminal());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&ElderStatus::DisabledPendingReview).unwrap();
        assert_eq!(json, "\"DISABLED_PENDING_REVIEW\"");
        assert_eq!(
            ElderStatus::parse("APPROVED_AWAITING_PAYMENT"),
            Some(ElderStatus::ApprovedAwaitingPayment)
        );
        assert_eq!(ElderStatus::parse("approved"), None);
    }

    #[test]
    fn test_new_elder_camel_case() {
        let req: NewElder = serde_json::from_str(
            r#"{"fullName":"Jane Doe","dob":"1950-01-01","gender":"female","address":"12 Elm St","medicalNotes":"none"}"#,
        )
        .unwrap();
        assert_eq!(req.medical_notes.as_deref(), Some("none"));
    }
}

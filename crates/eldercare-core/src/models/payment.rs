//! Admission payments.

use serde::{Deserialize, Serialize};

use super::Lifecycle;

/// Payment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl Lifecycle for PaymentStatus {
    const ALL: &'static [Self] = &[
        PaymentStatus::Pending,
        PaymentStatus::Success,
        PaymentStatus::Failed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Success)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

/// A payment opened when an operator approves an elder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub elder_id: String,
    pub guardian_id: String,
    pub amount: f64,
    pub status: PaymentStatus,
    /// Where the guardian would be sent to pay
    pub mock_checkout_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Payment {
    /// Open a pending payment. The checkout URL is `<checkout_base>/<id>`.
    pub fn open(elder_id: String, guardian_id: String, amount: f64, checkout_base: &str) -> Self {
        let id = super::new_id();
        let now = super::now();
        Self {
            mock_checkout_url: format!("{}/{}", checkout_base.trim_end_matches('/'), id),
            id,
            elder_id,
            guardian_id,
            amount,
            status: PaymentStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_payment() {
        let payment = Payment::open("e1".into(), "g1".into(), 1500.0, "http://pay/checkout/");
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(
            payment.mock_checkout_url,
            format!("http://pay/checkout/{}", payment.id)
        );
    }

    #[test]
    fn test_settled_payments_are_terminal() {
        assert!(PaymentStatus::Success.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Success.can_transition_to(PaymentStatus::Failed));
    }
}

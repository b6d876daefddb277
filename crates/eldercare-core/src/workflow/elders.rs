//! Elder admission: review, payment, activation and caretaker assignment.

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::{
    check_transition, ensure_written, required, Notification, NotificationKind, Transition,
    WorkflowSettings,
};
use crate::db::Database;
use crate::models::{
    Actor, Elder, ElderStatus, Guardian, Lifecycle, NewElder, Payment, PaymentStatus, Role,
};
use crate::policy::{authorize, Action, Resource};
use crate::{CoreError, CoreResult};

/// Elder and payment workflow.
pub struct ElderService<'a> {
    db: &'a Database,
    settings: &'a WorkflowSettings,
}

impl<'a> ElderService<'a> {
    pub fn new(db: &'a Database, settings: &'a WorkflowSettings) -> Self {
        Self { db, settings }
    }

    fn load(&self, id: &str) -> CoreResult<Elder> {
        self.db
            .get_elder(id)?
            .ok_or_else(|| CoreError::not_found("Elder", id))
    }

    fn guardian_of(&self, elder: &Elder) -> CoreResult<Guardian> {
        self.db
            .get_guardian(&elder.guardian_id)?
            .ok_or_else(|| CoreError::not_found("Guardian", &elder.guardian_id))
    }

    fn require_owner(actor: &Actor, elder: &Elder) -> CoreResult<()> {
        if actor.is(&elder.guardian_id) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("Elder {} belongs to another guardian", elder.id)))
        }
    }

    /// Move `elder` to `next` and write it, guarded on the status it was loaded with.
    fn advance(&self, db: &Database, elder: &mut Elder, next: ElderStatus) -> CoreResult<()> {
        let from = elder.status;
        check_transition("Elder", from, next)?;
        elder.status = next;
        elder.touch();
        ensure_written(db.update_elder_guarded(elder, from)?, "Elder", &elder.id)?;
        info!(
            elder_id = %elder.id,
            from = from.as_str(),
            to = next.as_str(),
            "elder status changed"
        );
        Ok(())
    }

    // =========================================================================
    // Guardian operations
    // =========================================================================

    /// Register a new elder under the calling guardian.
    pub fn submit(&self, actor: &Actor, mut request: NewElder) -> CoreResult<Elder> {
        authorize(actor, Resource::Elder, Action::Create)?;
        required(&request.full_name, "fullName")?;
        request.dob = request.dob.trim().to_string();
        let dob = NaiveDate::parse_from_str(&request.dob, "%Y-%m-%d")
            .map_err(|_| CoreError::BadRequest(format!("dob must be YYYY-MM-DD: {}", request.dob)))?;
        if dob >= Utc::now().date_naive() {
            return Err(CoreError::BadRequest("dob must be in the past".into()));
        }

        let elder = Elder::new(actor.account_id.clone(), request);
        self.db.insert_elder(&elder)?;
        info!(elder_id = %elder.id, guardian_id = %elder.guardian_id, "elder submitted");
        Ok(elder)
    }

    pub fn list_for_guardian(&self, actor: &Actor) -> CoreResult<Vec<Elder>> {
        authorize(actor, Resource::Elder, Action::Read)?;
        if actor.role != Role::Guardian {
            return Err(CoreError::Forbidden("Only guardians have their own elders".into()));
        }
        Ok(self.db.list_elders_for_guardian(&actor.account_id)?)
    }

    /// Fetch one elder. Guardians see their own, caretakers their assigned ones.
    pub fn get(&self, actor: &Actor, id: &str) -> CoreResult<Elder> {
        authorize(actor, Resource::Elder, Action::Read)?;
        let elder = self.load(id)?;
        match actor.role {
            Role::Guardian => Self::require_owner(actor, &elder)?,
            Role::Caretaker if elder.caretaker_id.as_deref() != Some(actor.account_id.as_str()) => {
                return Err(CoreError::Forbidden(format!("Elder {id} is not assigned to you")));
            }
            _ => {}
        }
        Ok(elder)
    }

    /// Hard-delete an elder that has no caretaker and no room.
    pub fn delete(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        authorize(actor, Resource::Elder, Action::Delete)?;
        let elder = self.load(id)?;
        Self::require_owner(actor, &elder)?;

        if elder.caretaker_id.is_some() {
            return Err(CoreError::Conflict(format!("Elder {id} still has a caretaker")));
        }
        if self.db.get_room_for_elder(id)?.is_some() {
            return Err(CoreError::Conflict(format!("Elder {id} still occupies a room")));
        }

        self.db.delete_elder(id)?;
        info!(elder_id = %id, "elder deleted");
        Ok(())
    }

    pub fn payments_for_guardian(&self, actor: &Actor) -> CoreResult<Vec<Payment>> {
        authorize(actor, Resource::Payment, Action::Read)?;
        Ok(self.db.list_payments_for_guardian(&actor.account_id)?)
    }

    /// Mock gateway callback. Success advances the elder to `PAYMENT_SUCCESS`.
    pub fn confirm_payment(
        &self,
        actor: &Actor,
        payment_id: &str,
        success: bool,
    ) -> CoreResult<Transition<Payment>> {
        authorize(actor, Resource::Payment, Action::Confirm)?;
        let mut payment = self
            .db
            .get_payment(payment_id)?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;
        if !actor.is(&payment.guardian_id) {
            return Err(CoreError::Forbidden(format!(
                "Payment {payment_id} belongs to another guardian"
            )));
        }

        let next = if success {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        };
        check_transition("Payment", payment.status, next)?;
        let mut elder = self.load(&payment.elder_id)?;
        if success {
            check_transition("Elder", elder.status, ElderStatus::PaymentSuccess)?;
        }

        self.db.atomic(|db| -> CoreResult<()> {
            let from = payment.status;
            payment.status = next;
            payment.updated_at = Utc::now().to_rfc3339();
            ensure_written(db.update_payment_guarded(&payment, from)?, "Payment", &payment.id)?;
            if success {
                self.advance(db, &mut elder, ElderStatus::PaymentSuccess)?;
            }
            Ok(())
        })?;
        info!(payment_id = %payment.id, status = payment.status.as_str(), "payment confirmed");

        if !success {
            return Ok(Transition::quiet(payment));
        }
        let guardian = self.guardian_of(&elder)?;
        let notification = Notification::new(
            NotificationKind::PaymentReceived,
            &guardian.email,
            "Payment received",
            format!(
                "We received your payment of {:.2} for {}. Admission will be finalised shortly.",
                payment.amount, elder.full_name
            ),
        );
        Ok(Transition::notify(payment, notification))
    }

    /// Open a fresh payment after the previous one failed.
    pub fn reopen_payment(&self, actor: &Actor, elder_id: &str) -> CoreResult<Transition<Payment>> {
        authorize(actor, Resource::Payment, Action::Create)?;
        let mut elder = self.load(elder_id)?;
        Self::require_owner(actor, &elder)?;

        if elder.status != ElderStatus::ApprovedAwaitingPayment {
            return Err(CoreError::InvalidState(format!(
                "Elder {elder_id} is {} and not awaiting payment",
                elder.status.as_str()
            )));
        }
        if let Some(current) = elder.payment_id.as_deref() {
            if let Some(payment) = self.db.get_payment(current)? {
                if payment.status != PaymentStatus::Failed {
                    return Err(CoreError::Conflict(format!(
                        "Payment {} is {}",
                        payment.id,
                        payment.status.as_str()
                    )));
                }
            }
        }

        let payment = self.open_payment(&elder);
        self.db.atomic(|db| -> CoreResult<()> {
            db.insert_payment(&payment)?;
            let status = elder.status;
            elder.payment_id = Some(payment.id.clone());
            elder.touch();
            ensure_written(db.update_elder_guarded(&elder, status)?, "Elder", &elder.id)
        })?;
        info!(elder_id = %elder.id, payment_id = %payment.id, "payment reopened");

        let guardian = self.guardian_of(&elder)?;
        let notification = self.payment_requested(&guardian, &elder, &payment);
        Ok(Transition::notify(payment, notification))
    }

    // =========================================================================
    // Operator operations
    // =========================================================================

    pub fn list_by_status(&self, actor: &Actor, status: Option<ElderStatus>) -> CoreResult<Vec<Elder>> {
        authorize(actor, Resource::Elder, Action::List)?;
        Ok(match status {
            Some(status) => self.db.list_elders_by_status(status)?,
            None => self.db.list_elders()?,
        })
    }

    pub fn list_payments(&self, actor: &Actor, status: Option<PaymentStatus>) -> CoreResult<Vec<Payment>> {
        authorize(actor, Resource::Payment, Action::List)?;
        Ok(self.db.list_payments(status)?)
    }

    fn open_payment(&self, elder: &Elder) -> Payment {
        Payment::open(
            elder.id.clone(),
            elder.guardian_id.clone(),
            self.settings.elder_fee,
            &self.settings.checkout_base_url,
        )
    }

    fn payment_requested(&self, guardian: &Guardian, elder: &Elder, payment: &Payment) -> Notification {
        Notification::new(
            NotificationKind::PaymentRequested,
            &guardian.email,
            "Registration approved: payment required",
            format!(
                "The registration of {} was approved. Please pay {:.2} at {}",
                elder.full_name, payment.amount, payment.mock_checkout_url
            ),
        )
    }

    /// Approve a pending elder and open its payment.
    pub fn approve(&self, actor: &Actor, id: &str) -> CoreResult<Transition<Elder>> {
        authorize(actor, Resource::Elder, Action::Approve)?;
        let mut elder = self.load(id)?;
        check_transition("Elder", elder.status, ElderStatus::ApprovedAwaitingPayment)?;

        let payment = self.open_payment(&elder);
        self.db.atomic(|db| -> CoreResult<()> {
            db.insert_payment(&payment)?;
            elder.payment_id = Some(payment.id.clone());
            self.advance(db, &mut elder, ElderStatus::ApprovedAwaitingPayment)
        })?;

        let guardian = self.guardian_of(&elder)?;
        let notification = self.payment_requested(&guardian, &elder, &payment);
        Ok(Transition::notify(elder, notification))
    }

    pub fn reject(&self, actor: &Actor, id: &str, reason: &str) -> CoreResult<Transition<Elder>> {
        authorize(actor, Resource::Elder, Action::Reject)?;
        let reason = required(reason, "reason")?;
        let mut elder = self.load(id)?;

        elder.rejection_reason = Some(reason.clone());
        self.advance(self.db, &mut elder, ElderStatus::Rejected)?;

        let guardian = self.guardian_of(&elder)?;
        let notification = Notification::new(
            NotificationKind::ElderRejected,
            &guardian.email,
            "Registration rejected",
            format!("The registration of {} was rejected: {}", elder.full_name, reason),
        );
        Ok(Transition::notify(elder, notification))
    }

    /// Nudge the guardian about an open payment. Nothing is persisted.
    pub fn send_payment_reminder(&self, actor: &Actor, id: &str) -> CoreResult<Transition<Elder>> {
        authorize(actor, Resource::Elder, Action::Remind)?;
        let elder = self.load(id)?;
        if elder.status != ElderStatus::ApprovedAwaitingPayment {
            return Err(CoreError::InvalidState(format!(
                "Elder {id} is {} and not awaiting payment",
                elder.status.as_str()
            )));
        }

        let link = match elder.payment_id.as_deref() {
            Some(payment_id) => self
                .db
                .get_payment(payment_id)?
                .map(|p| p.mock_checkout_url)
                .unwrap_or_default(),
            None => String::new(),
        };
        let guardian = self.guardian_of(&elder)?;
        let notification = Notification::new(
            NotificationKind::PaymentReminder,
            &guardian.email,
            "Payment reminder",
            format!(
                "The admission payment for {} is still open. {}",
                elder.full_name, link
            ),
        );
        info!(elder_id = %elder.id, "payment reminder sent");
        Ok(Transition::notify(elder, notification))
    }

    /// Activate a paid elder. The payment must have succeeded.
    pub fn activate(&self, actor: &Actor, id: &str) -> CoreResult<Transition<Elder>> {
        authorize(actor, Resource::Elder, Action::Activate)?;
        let mut elder = self.load(id)?;

        let paid = match elder.payment_id.as_deref() {
            Some(payment_id) => self
                .db
                .get_payment(payment_id)?
                .map(|p| p.status == PaymentStatus::Success)
                .unwrap_or(false),
            None => false,
        };
        if !paid {
            return Err(CoreError::BadRequest(format!(
                "Elder {id} has no successful payment"
            )));
        }

        self.advance(self.db, &mut elder, ElderStatus::Active)?;

        let guardian = self.guardian_of(&elder)?;
        let notification = Notification::new(
            NotificationKind::ElderActivated,
            &guardian.email,
            "Admission complete",
            format!("{} is now an active resident.", elder.full_name),
        );
        Ok(Transition::notify(elder, notification))
    }

    /// Give an admitted elder to a caretaker, leaving the previous one.
    pub fn assign_caretaker(
        &self,
        actor: &Actor,
        elder_id: &str,
        caretaker_id: &str,
    ) -> CoreResult<Transition<Elder>> {
        authorize(actor, Resource::Elder, Action::Assign)?;
        let mut elder = self.load(elder_id)?;
        if !elder.status.is_admitted() {
            return Err(CoreError::InvalidState(format!(
                "Elder {elder_id} is {} and cannot be assigned",
                elder.status.as_str()
            )));
        }

        let target_ok = self
            .db
            .get_staff(caretaker_id)?
            .map(|s| s.role == Role::Caretaker && s.active)
            .unwrap_or(false);
        if !target_ok || self.db.get_caretaker(caretaker_id)?.is_none() {
            return Err(CoreError::BadRequest(format!(
                "{caretaker_id} is not an active caretaker"
            )));
        }

        if elder.caretaker_id.as_deref() == Some(caretaker_id) {
            return Ok(Transition::quiet(elder));
        }

        let previous = elder.caretaker_id.replace(caretaker_id.to_string());
        self.db.atomic(|db| -> CoreResult<()> {
            if let Some(previous) = previous.as_deref() {
                db.unlink_caretaker_elder(previous, &elder.id)?;
            }
            db.link_caretaker_elder(caretaker_id, &elder.id)?;
            let status = elder.status;
            elder.touch();
            ensure_written(db.update_elder_guarded(&elder, status)?, "Elder", &elder.id)
        })?;
        info!(
            elder_id = %elder.id,
            caretaker_id = %caretaker_id,
            previous = previous.as_deref().unwrap_or("-"),
            "caretaker assigned"
        );
        Ok(Transition::quiet(elder))
    }

    /// Elders assigned to the calling caretaker.
    pub fn list_for_caretaker(&self, actor: &Actor) -> CoreResult<Vec<Elder>> {
        authorize(actor, Resource::Elder, Action::ListAssigned)?;
        Ok(self.db.list_elders_for_caretaker(&actor.account_id)?)
    }
}

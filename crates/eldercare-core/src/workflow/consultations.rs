//! Consultations, appointments and prescriptions.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{check_transition, ensure_written, required, Notification, NotificationKind, Transition};
use crate::db::{ConsultationScope, Database};
use crate::models::{
    Actor, Appointment, AppointmentStatus, Consultation, ConsultationDecision, ConsultationStatus,
    Elder, Lifecycle, NewConsultation, NewPrescription, Prescription, Role,
};
use crate::policy::{authorize, Action, Resource};
use crate::{CoreError, CoreResult};

pub struct ConsultationService<'a> {
    db: &'a Database,
}

impl<'a> ConsultationService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn load(&self, id: &str) -> CoreResult<Consultation> {
        self.db
            .get_consultation(id)?
            .ok_or_else(|| CoreError::not_found("Consultation", id))
    }

    fn load_elder(&self, id: &str) -> CoreResult<Elder> {
        self.db
            .get_elder(id)?
            .ok_or_else(|| CoreError::not_found("Elder", id))
    }

    fn is_active_doctor(&self, id: &str) -> CoreResult<bool> {
        Ok(self
            .db
            .get_staff(id)?
            .map(|s| s.role == Role::Doctor && s.active)
            .unwrap_or(false))
    }

    /// Caretaker asks a doctor to see one of their elders.
    pub fn create(&self, actor: &Actor, request: NewConsultation) -> CoreResult<Consultation> {
        authorize(actor, Resource::Consultation, Action::Create)?;
        let elder = self.load_elder(&request.elder_id)?;
        if elder.caretaker_id.as_deref() != Some(actor.account_id.as_str()) {
            return Err(CoreError::Forbidden(format!(
                "Elder {} is not assigned to you",
                elder.id
            )));
        }
        if !self.is_active_doctor(&request.doctor_id)? {
            return Err(CoreError::BadRequest(format!(
                "{} is not an active doctor",
                request.doctor_id
            )));
        }
        let reason = required(&request.reason, "reason")?;

        let consultation = Consultation::new(elder.id, actor.account_id.clone(), request.doctor_id, reason);
        self.db.insert_consultation(&consultation)?;
        info!(
            consultation_id = %consultation.id,
            doctor_id = %consultation.doctor_id,
            "consultation requested"
        );
        Ok(consultation)
    }

    /// Consultations visible to the caller.
    pub fn list(&self, actor: &Actor) -> CoreResult<Vec<Consultation>> {
        authorize(actor, Resource::Consultation, Action::List)?;
        let scope = match actor.role {
            Role::Doctor => ConsultationScope::Doctor(&actor.account_id),
            Role::Caretaker => ConsultationScope::Caretaker(&actor.account_id),
            _ => ConsultationScope::All,
        };
        Ok(self.db.list_consultations(scope)?)
    }

    /// Doctor approves. A `scheduledAt` books exactly one appointment.
    pub fn approve(
        &self,
        actor: &Actor,
        id: &str,
        decision: ConsultationDecision,
    ) -> CoreResult<Transition<Consultation>> {
        authorize(actor, Resource::Consultation, Action::Approve)?;
        let scheduled_at = decision
            .scheduled_at
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s.trim())
                    .map(|t| t.with_timezone(&Utc).to_rfc3339())
                    .map_err(|_| CoreError::BadRequest(format!("scheduledAt must be RFC 3339: {s}")))
            })
            .transpose()?;
        self.decide(actor, id, ConsultationStatus::Approved, decision.response_notes, scheduled_at)
    }

    /// Doctor declines. No appointment is created.
    pub fn reject(
        &self,
        actor: &Actor,
        id: &str,
        decision: ConsultationDecision,
    ) -> CoreResult<Transition<Consultation>> {
        authorize(actor, Resource::Consultation, Action::Reject)?;
        self.decide(actor, id, ConsultationStatus::Rejected, decision.response_notes, None)
    }

    fn decide(
        &self,
        actor: &Actor,
        id: &str,
        next: ConsultationStatus,
        notes: Option<String>,
        scheduled_at: Option<String>,
    ) -> CoreResult<Transition<Consultation>> {
        let mut consultation = self.load(id)?;
        if !actor.is(&consultation.doctor_id) {
            return Err(CoreError::Forbidden(format!(
                "Consultation {id} is addressed to another doctor"
            )));
        }
        let from = consultation.status;
        check_transition("Consultation", from, next)?;

        consultation.status = next;
        consultation.response_notes = notes;
        consultation.updated_at = Utc::now().to_rfc3339();
        let appointment = scheduled_at.map(|at| Appointment::from_consultation(&consultation, at));
        consultation.appointment_id = appointment.as_ref().map(|a| a.id.clone());

        self.db.atomic(|db| -> CoreResult<()> {
            ensure_written(
                db.update_consultation_guarded(&consultation, from)?,
                "Consultation",
                &consultation.id,
            )?;
            if let Some(appointment) = &appointment {
                db.insert_appointment(appointment)?;
            }
            Ok(())
        })?;
        info!(
            consultation_id = %consultation.id,
            status = next.as_str(),
            appointment = consultation.appointment_id.as_deref().unwrap_or("-"),
            "consultation decided"
        );

        let Some(caretaker) = self.db.get_staff(&consultation.caretaker_id)? else {
            return Ok(Transition::quiet(consultation));
        };
        let when = appointment
            .as_ref()
            .map(|a| format!(" Appointment scheduled for {}.", a.scheduled_at))
            .unwrap_or_default();
        let notification = Notification::new(
            NotificationKind::ConsultationDecided,
            &caretaker.email,
            format!("Consultation {}", next.as_str().to_lowercase()),
            format!(
                "Your consultation request \"{}\" was {}.{}",
                consultation.reason,
                next.as_str().to_lowercase(),
                when
            ),
        );
        Ok(Transition::notify(consultation, notification))
    }

    // =========================================================================
    // Appointments
    // =========================================================================

    /// Doctors see their own appointments, admins see all.
    pub fn appointments(&self, actor: &Actor) -> CoreResult<Vec<Appointment>> {
        authorize(actor, Resource::Appointment, Action::List)?;
        let doctor = (actor.role == Role::Doctor).then_some(actor.account_id.as_str());
        Ok(self.db.list_appointments(doctor)?)
    }

    pub fn complete_appointment(&self, actor: &Actor, id: &str, notes: Option<String>) -> CoreResult<Appointment> {
        self.close_appointment(actor, id, AppointmentStatus::Completed, notes)
    }

    pub fn cancel_appointment(&self, actor: &Actor, id: &str, notes: Option<String>) -> CoreResult<Appointment> {
        self.close_appointment(actor, id, AppointmentStatus::Cancelled, notes)
    }

    fn close_appointment(
        &self,
        actor: &Actor,
        id: &str,
        next: AppointmentStatus,
        notes: Option<String>,
    ) -> CoreResult<Appointment> {
        authorize(actor, Resource::Appointment, Action::Update)?;
        let mut appointment = self
            .db
            .get_appointment(id)?
            .ok_or_else(|| CoreError::not_found("Appointment", id))?;
        if !actor.is(&appointment.doctor_id) {
            return Err(CoreError::Forbidden(format!(
                "Appointment {id} belongs to another doctor"
            )));
        }
        let from = appointment.status;
        check_transition("Appointment", from, next)?;

        appointment.status = next;
        if notes.is_some() {
            appointment.notes = notes;
        }
        appointment.updated_at = Utc::now().to_rfc3339();
        ensure_written(
            self.db.update_appointment_guarded(&appointment, from)?,
            "Appointment",
            id,
        )?;
        info!(appointment_id = %id, status = next.as_str(), "appointment closed");
        Ok(appointment)
    }

    // =========================================================================
    // Prescriptions
    // =========================================================================

    pub fn prescribe(&self, actor: &Actor, request: NewPrescription) -> CoreResult<Prescription> {
        authorize(actor, Resource::Prescription, Action::Create)?;
        let elder = self.load_elder(&request.elder_id)?;
        if request.medications.is_empty() {
            return Err(CoreError::BadRequest("At least one medication is required".into()));
        }
        for medication in &request.medications {
            required(&medication.name, "medication name")?;
        }

        if let Some(appointment_id) = request.appointment_id.as_deref() {
            let appointment = self
                .db
                .get_appointment(appointment_id)?
                .ok_or_else(|| CoreError::not_found("Appointment", appointment_id))?;
            if appointment.elder_id != elder.id || appointment.doctor_id != actor.account_id {
                return Err(CoreError::BadRequest(format!(
                    "Appointment {appointment_id} is for another elder or doctor"
                )));
            }
        }

        let prescription = Prescription {
            id: uuid::Uuid::new_v4().to_string(),
            elder_id: elder.id,
            doctor_id: actor.account_id.clone(),
            appointment_id: request.appointment_id,
            medications: request.medications,
            notes: request.notes,
            issued_at: Utc::now().to_rfc3339(),
        };
        self.db.insert_prescription(&prescription)?;
        info!(prescription_id = %prescription.id, elder_id = %prescription.elder_id, "prescription issued");
        Ok(prescription)
    }

    /// Prescriptions for one elder: doctors, admins, its caretaker and its guardian.
    pub fn prescriptions_for_elder(&self, actor: &Actor, elder_id: &str) -> CoreResult<Vec<Prescription>> {
        authorize(actor, Resource::Prescription, Action::Read)?;
        let elder = self.load_elder(elder_id)?;
        let allowed = match actor.role {
            Role::Guardian => actor.is(&elder.guardian_id),
            Role::Caretaker => elder.caretaker_id.as_deref() == Some(actor.account_id.as_str()),
            _ => true,
        };
        if !allowed {
            return Err(CoreError::Forbidden(format!(
                "Not allowed to read prescriptions of elder {elder_id}"
            )));
        }
        Ok(self.db.list_prescriptions_for_elder(elder_id)?)
    }
}

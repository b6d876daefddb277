//! Consultations, appointments and prescriptions.

use serde::{Deserialize, Serialize};

use super::Lifecycle;

/// Consultation request status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConsultationStatus {
    Pending,
    Approved,
    Rejected,
}

impl Lifecycle for ConsultationStatus {
    const ALL: &'static [Self] = &[
        ConsultationStatus::Pending,
        ConsultationStatus::Approved,
        ConsultationStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "Pending",
            ConsultationStatus::Approved => "Approved",
            ConsultationStatus::Rejected => "Rejected",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (ConsultationStatus::Pending, ConsultationStatus::Approved)
                | (ConsultationStatus::Pending, ConsultationStatus::Rejected)
        )
    }
}

/// A caretaker's request for a doctor to see an elder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: String,
    pub elder_id: String,
    pub caretaker_id: String,
    pub doctor_id: String,
    pub reason: String,
    pub status: ConsultationStatus,
    /// Doctor's reply
    pub response_notes: Option<String>,
    /// Appointment created on approval, if a date was given
    pub appointment_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Consultation {
    pub fn new(elder_id: String, caretaker_id: String, doctor_id: String, reason: String) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            elder_id,
            caretaker_id,
            doctor_id,
            reason,
            status: ConsultationStatus::Pending,
            response_notes: None,
            appointment_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl Lifecycle for AppointmentStatus {
    const ALL: &'static [Self] = &[
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Scheduled, AppointmentStatus::Completed)
                | (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
        )
    }
}

/// A scheduled doctor visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    /// Originating consultation
    pub consultation_id: Option<String>,
    pub elder_id: String,
    pub doctor_id: String,
    pub caretaker_id: Option<String>,
    /// RFC 3339
    pub scheduled_at: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Appointment scheduled from an approved consultation.
    pub fn from_consultation(consultation: &Consultation, scheduled_at: String) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            consultation_id: Some(consultation.id.clone()),
            elder_id: consultation.elder_id.clone(),
            doctor_id: consultation.doctor_id.clone(),
            caretaker_id: Some(consultation.caretaker_id.clone()),
            scheduled_at,
            status: AppointmentStatus::Scheduled,
            notes: consultation.response_notes.clone(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// One line of a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

/// A doctor's prescription for an elder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub elder_id: String,
    pub doctor_id: String,
    pub appointment_id: Option<String>,
    pub medications: Vec<Medication>,
    pub notes: Option<String>,
    pub issued_at: String,
}

/// Doctor payload for issuing a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub elder_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Caretaker payload for requesting a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewConsultation {
    pub elder_id: String,
    pub doctor_id: String,
    pub reason: String,
}

/// Doctor's answer to a consultation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationDecision {
    #[serde(default)]
    pub response_notes: Option<String>,
    /// RFC 3339. When present on approval an appointment is booked.
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_from_consultation() {
        let mut consultation =
            Consultation::new("e1".into(), "c1".into(), "d1".into(), "dizziness".into());
        consultation.response_notes = Some("bring chart".into());

        let appt = Appointment::from_consultation(&consultation, "2026-11-01T10:00:00Z".into());
        assert_eq!(appt.consultation_id.as_deref(), Some(consultation.id.as_str()));
        assert_eq!(appt.elder_id, "e1");
        assert_eq!(appt.doctor_id, "d1");
        assert_eq!(appt.caretaker_id.as_deref(), Some("c1"));
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_decided_consultation_is_terminal() {
        assert!(ConsultationStatus::Approved.is_terminal());
        assert!(ConsultationStatus::Rejected.is_terminal());
        assert_eq!(
            serde_json::to_string(&ConsultationStatus::Pending).unwrap(),
            "\"Pending\""
        );
    }
}

//! Consultation, appointment and prescription database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::elders::parse_status;
use super::{Database, DbError, DbResult};
use crate::models::{
    Appointment, AppointmentStatus, Consultation, ConsultationStatus, Lifecycle, Medication,
    Prescription,
};

const CONSULTATION_COLUMNS: &str = "id, elder_id, caretaker_id, doctor_id, reason, status, \
     response_notes, appointment_id, created_at, updated_at";

const APPOINTMENT_COLUMNS: &str = "id, consultation_id, elder_id, doctor_id, caretaker_id, \
     scheduled_at, status, notes, created_at, updated_at";

const PRESCRIPTION_COLUMNS: &str =
    "id, elder_id, doctor_id, appointment_id, medications, notes, issued_at";

/// Who a consultation listing is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationScope<'a> {
    Doctor(&'a str),
    Caretaker(&'a str),
    All,
}

impl Database {
    // =========================================================================
    // Consultations
    // =========================================================================

    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO consultations ({CONSULTATION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                consultation.id,
                consultation.elder_id,
                consultation.caretaker_id,
                consultation.doctor_id,
                consultation.reason,
                consultation.status.as_str(),
                consultation.response_notes,
                consultation.appointment_id,
                consultation.created_at,
                consultation.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Record a doctor's decision if the consultation is still `expected`.
    pub fn update_consultation_guarded(
        &self,
        consultation: &Consultation,
        expected: ConsultationStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE consultations SET
                status = ?2,
                response_notes = ?3,
                appointment_id = ?4,
                updated_at = ?5
            WHERE id = ?1 AND status = ?6
            "#,
            params![
                consultation.id,
                consultation.status.as_str(),
                consultation.response_notes,
                consultation.appointment_id,
                consultation.updated_at,
                expected.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_consultation(&self, id: &str) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!("SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE id = ?"),
                [id],
                consultation_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List consultations visible to a scope, newest first.
    pub fn list_consultations(&self, scope: ConsultationScope<'_>) -> DbResult<Vec<Consultation>> {
        let (filter, param) = match scope {
            ConsultationScope::Doctor(id) => ("doctor_id = ?1", Some(id)),
            ConsultationScope::Caretaker(id) => ("caretaker_id = ?1", Some(id)),
            ConsultationScope::All => ("?1 IS NULL", None),
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE {filter} ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([param], consultation_row)?;

        let mut consultations = Vec::new();
        for row in rows {
            consultations.push(row?.try_into()?);
        }
        Ok(consultations)
    }

    // =========================================================================
    // Appointments
    // =========================================================================

    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO appointments ({APPOINTMENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                appointment.id,
                appointment.consultation_id,
                appointment.elder_id,
                appointment.doctor_id,
                appointment.caretaker_id,
                appointment.scheduled_at,
                appointment.status.as_str(),
                appointment.notes,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_appointment_guarded(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2, notes = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?5",
            params![
                appointment.id,
                appointment.status.as_str(),
                appointment.notes,
                appointment.updated_at,
                expected.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"),
                [id],
                appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List appointments, optionally for one doctor, soonest first.
    pub fn list_appointments(&self, doctor_id: Option<&str>) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE (?1 IS NULL OR doctor_id = ?1) ORDER BY scheduled_at ASC"
        ))?;
        let rows = stmt.query_map([doctor_id], appointment_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Appointments created from a consultation.
    pub fn count_appointments_for_consultation(&self, consultation_id: &str) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE consultation_id = ?",
            [consultation_id],
            |row| row.get(0),
        )?)
    }

    // =========================================================================
    // Prescriptions
    // =========================================================================

    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        let medications_json = serde_json::to_string(&prescription.medications)?;
        self.conn.execute(
            &format!(
                "INSERT INTO prescriptions ({PRESCRIPTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                prescription.id,
                prescription.elder_id,
                prescription.doctor_id,
                prescription.appointment_id,
                medications_json,
                prescription.notes,
                prescription.issued_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_prescriptions_for_elder(&self, elder_id: &str) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE elder_id = ? ORDER BY issued_at DESC"
        ))?;
        let rows = stmt.query_map([elder_id], |row| {
            Ok(PrescriptionRow {
                id: row.get(0)?,
                elder_id: row.get(1)?,
                doctor_id: row.get(2)?,
                appointment_id: row.get(3)?,
                medications: row.get(4)?,
                notes: row.get(5)?,
                issued_at: row.get(6)?,
            })
        })?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }
}

struct ConsultationRow {
    id: String,
    elder_id: String,
    caretaker_id: String,
    doctor_id: String,
    reason: String,
    status: String,
    response_notes: Option<String>,
    appointment_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn consultation_row(row: &Row<'_>) -> rusqlite::Result<ConsultationRow> {
    Ok(ConsultationRow {
        id: row.get(0)?,
        elder_id: row.get(1)?,
        caretaker_id: row.get(2)?,
        doctor_id: row.get(3)?,
        reason: row.get(4)?,
        status: row.get(5)?,
        response_notes: row.get(6)?,
        appointment_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl TryFrom<ConsultationRow> for Consultation {
    type Error = DbError;

    fn try_from(row: ConsultationRow) -> Result<Self, Self::Error> {
        Ok(Consultation {
            id: row.id,
            elder_id: row.elder_id,
            caretaker_id: row.caretaker_id,
            doctor_id: row.doctor_id,
            reason: row.reason,
            status: parse_status(&row.status)?,
            response_notes: row.response_notes,
            appointment_id: row.appointment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct AppointmentRow {
    id: String,
    consultation_id: Option<String>,
    elder_id: String,
    doctor_id: String,
    caretaker_id: Option<String>,
    scheduled_at: String,
    status: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        consultation_id: row.get(1)?,
        elder_id: row.get(2)?,
        doctor_id: row.get(3)?,
        caretaker_id: row.get(4)?,
        scheduled_at: row.get(5)?,
        status: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            consultation_id: row.consultation_id,
            elder_id: row.elder_id,
            doctor_id: row.doctor_id,
            caretaker_id: row.caretaker_id,
            scheduled_at: row.scheduled_at,
            status: parse_status(&row.status)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct PrescriptionRow {
    id: String,
    elder_id: String,
    doctor_id: String,
    appointment_id: Option<String>,
    medications: String,
    notes: Option<String>,
    issued_at: String,
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let medications: Vec<Medication> = serde_json::from_str(&row.medications)?;
        Ok(Prescription {
            id: row.id,
            elder_id: row.elder_id,
            doctor_id: row.doctor_id,
            appointment_id: row.appointment_id,
            medications,
            notes: row.notes,
            issued_at: row.issued_at,
        })
    }
}

//! Elder and payment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Elder, ElderStatus, Lifecycle, Payment, PaymentStatus};

const ELDER_COLUMNS: &str = "id, full_name, dob, gender, address, medical_notes, guardian_id, \
     caretaker_id, status, payment_id, rejection_reason, created_at, updated_at";

const PAYMENT_COLUMNS: &str =
    "id, elder_id, guardian_id, amount, status, mock_checkout_url, created_at, updated_at";

impl Database {
    // =========================================================================
    // Elders
    // =========================================================================

    /// Insert a new elder.
    pub fn insert_elder(&self, elder: &Elder) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO elders ({ELDER_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                elder.id,
                elder.full_name,
                elder.dob,
                elder.gender,
                elder.address,
                elder.medical_notes,
                elder.guardian_id,
                elder.caretaker_id,
                elder.status.as_str(),
                elder.payment_id,
                elder.rejection_reason,
                elder.created_at,
                elder.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Write an elder's mutable fields, but only if its stored status is still
    /// `expected`. Returns false when another writer got there first.
    pub fn update_elder_guarded(&self, elder: &Elder, expected: ElderStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE elders SET
                caretaker_id = ?2,
                status = ?3,
                payment_id = ?4,
                rejection_reason = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = ?7
            "#,
            params![
                elder.id,
                elder.caretaker_id,
                elder.status.as_str(),
                elder.payment_id,
                elder.rejection_reason,
                elder.updated_at,
                expected.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an elder by ID.
    pub fn get_elder(&self, id: &str) -> DbResult<Option<Elder>> {
        self.conn
            .query_row(
                &format!("SELECT {ELDER_COLUMNS} FROM elders WHERE id = ?"),
                [id],
                elder_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a guardian's elders, newest first.
    pub fn list_elders_for_guardian(&self, guardian_id: &str) -> DbResult<Vec<Elder>> {
        self.query_elders(
            &format!(
                "SELECT {ELDER_COLUMNS} FROM elders WHERE guardian_id = ? ORDER BY created_at DESC"
            ),
            guardian_id,
        )
    }

    /// List elders assigned to a caretaker.
    pub fn list_elders_for_caretaker(&self, caretaker_id: &str) -> DbResult<Vec<Elder>> {
        self.query_elders(
            &format!(
                "SELECT {ELDER_COLUMNS} FROM elders WHERE caretaker_id = ? ORDER BY full_name"
            ),
            caretaker_id,
        )
    }

    /// List elders by status, oldest first (review queue order).
    pub fn list_elders_by_status(&self, status: ElderStatus) -> DbResult<Vec<Elder>> {
        self.query_elders(
            &format!(
                "SELECT {ELDER_COLUMNS} FROM elders WHERE status = ? ORDER BY created_at ASC"
            ),
            status.as_str(),
        )
    }

    /// List every elder.
    pub fn list_elders(&self) -> DbResult<Vec<Elder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ELDER_COLUMNS} FROM elders ORDER BY created_at ASC"))?;
        let rows = stmt.query_map([], elder_row)?;

        let mut elders = Vec::new();
        for row in rows {
            elders.push(row?.try_into()?);
        }
        Ok(elders)
    }

    fn query_elders(&self, sql: &str, param: &str) -> DbResult<Vec<Elder>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([param], elder_row)?;

        let mut elders = Vec::new();
        for row in rows {
            elders.push(row?.try_into()?);
        }
        Ok(elders)
    }

    /// Delete an elder (and, by cascade, its payments and care records).
    pub fn delete_elder(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM elders WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    pub fn insert_payment(&self, payment: &Payment) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                payment.id,
                payment.elder_id,
                payment.guardian_id,
                payment.amount,
                payment.status.as_str(),
                payment.mock_checkout_url,
                payment.created_at,
                payment.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Move a payment from `expected` to its new status.
    pub fn update_payment_guarded(&self, payment: &Payment, expected: PaymentStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE payments SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
            params![
                payment.id,
                payment.status.as_str(),
                payment.updated_at,
                expected.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_payment(&self, id: &str) -> DbResult<Option<Payment>> {
        self.conn
            .query_row(
                &format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"),
                [id],
                payment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List payments, optionally filtered by status.
    pub fn list_payments(&self, status: Option<PaymentStatus>) -> DbResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([status.map(|s| s.as_str())], payment_row)?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.try_into()?);
        }
        Ok(payments)
    }

    pub fn list_payments_for_guardian(&self, guardian_id: &str) -> DbResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE guardian_id = ? ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([guardian_id], payment_row)?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.try_into()?);
        }
        Ok(payments)
    }
}

/// Intermediate row struct for database mapping.
struct ElderRow {
    id: String,
    full_name: String,
    dob: String,
    gender: Option<String>,
    address: Option<String>,
    medical_notes: Option<String>,
    guardian_id: String,
    caretaker_id: Option<String>,
    status: String,
    payment_id: Option<String>,
    rejection_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

fn elder_row(row: &Row<'_>) -> rusqlite::Result<ElderRow> {
    Ok(ElderRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        dob: row.get(2)?,
        gender: row.get(3)?,
        address: row.get(4)?,
        medical_notes: row.get(5)?,
        guardian_id: row.get(6)?,
        caretaker_id: row.get(7)?,
        status: row.get(8)?,
        payment_id: row.get(9)?,
        rejection_reason: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<ElderRow> for Elder {
    type Error = DbError;

    fn try_from(row: ElderRow) -> Result<Self, Self::Error> {
        Ok(Elder {
            id: row.id,
            full_name: row.full_name,
            dob: row.dob,
            gender: row.gender,
            address: row.address,
            medical_notes: row.medical_notes,
            guardian_id: row.guardian_id,
            caretaker_id: row.caretaker_id,
            status: parse_status(&row.status)?,
            payment_id: row.payment_id,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct PaymentRow {
    id: String,
    elder_id: String,
    guardian_id: String,
    amount: f64,
    status: String,
    mock_checkout_url: String,
    created_at: String,
    updated_at: String,
}

fn payment_row(row: &Row<'_>) -> rusqlite::Result<PaymentRow> {
    Ok(PaymentRow {
        id: row.get(0)?,
        elder_id: row.get(1)?,
        guardian_id: row.get(2)?,
        amount: row.get(3)?,
        status: row.get(4)?,
        mock_checkout_url: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            elder_id: row.elder_id,
            guardian_id: row.guardian_id,
            amount: row.amount,
            status: parse_status(&row.status)?,
            mock_checkout_url: row.mock_checkout_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Parse a stored lifecycle status, rejecting unknown values.
pub(crate) fn parse_status<S: Lifecycle>(s: &str) -> Result<S, DbError> {
    S::parse(s).ok_or_else(|| DbError::Constraint(format!("Unknown status: {}", s)))
}

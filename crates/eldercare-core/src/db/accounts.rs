//! Guardian, staff, caretaker and session database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Caretaker, Credentials, Guardian, Role, Session, Staff};

const GUARDIAN_COLUMNS: &str = "id, name, email, phone, address, created_at";

const STAFF_COLUMNS: &str =
    "id, name, email, role, phone, specialization, active, created_at, updated_at";

impl Database {
    // =========================================================================
    // Guardians
    // =========================================================================

    /// Insert a new guardian with its password digest.
    pub fn insert_guardian(&self, guardian: &Guardian, password_hash: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO guardians (
                id, name, email, phone, address, password_hash, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                guardian.id,
                guardian.name,
                guardian.email,
                guardian.phone,
                guardian.address,
                password_hash,
                guardian.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a guardian by ID.
    pub fn get_guardian(&self, id: &str) -> DbResult<Option<Guardian>> {
        self.conn
            .query_row(
                &format!("SELECT {GUARDIAN_COLUMNS} FROM guardians WHERE id = ?"),
                [id],
                guardian_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Password digest for a guardian login.
    pub fn guardian_credentials(&self, email: &str) -> DbResult<Option<Credentials>> {
        self.conn
            .query_row(
                "SELECT id, password_hash FROM guardians WHERE email = ?",
                [email],
                |row| {
                    Ok(Credentials {
                        account_id: row.get(0)?,
                        role: Role::Guardian,
                        password_hash: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // =========================================================================
    // Staff
    // =========================================================================

    /// Insert a staff member. Caretakers also get their caretaker record.
    pub fn insert_staff(&self, staff: &Staff, password_hash: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO staff (
                id, name, email, role, phone, specialization, active,
                password_hash, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                staff.id,
                staff.name,
                staff.email,
                staff.role.as_str(),
                staff.phone,
                staff.specialization,
                staff.active,
                password_hash,
                staff.created_at,
                staff.updated_at,
            ],
        )?;

        if staff.role == Role::Caretaker {
            self.conn
                .execute("INSERT INTO caretakers (staff_id) VALUES (?)", [&staff.id])?;
        }
        Ok(())
    }

    /// Update a staff member's profile fields.
    pub fn update_staff(&self, staff: &Staff) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE staff SET
                name = ?2,
                phone = ?3,
                specialization = ?4,
                active = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                staff.id,
                staff.name,
                staff.phone,
                staff.specialization,
                staff.active,
                staff.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a staff member by ID.
    pub fn get_staff(&self, id: &str) -> DbResult<Option<Staff>> {
        self.conn
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?"),
                [id],
                staff_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List staff, optionally filtered by role.
    pub fn list_staff(&self, role: Option<Role>) -> DbResult<Vec<Staff>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE (?1 IS NULL OR role = ?1) ORDER BY name"
        ))?;
        let rows = stmt.query_map([role.map(|r| r.as_str())], staff_row)?;

        let mut staff = Vec::new();
        for row in rows {
            staff.push(row?.try_into()?);
        }
        Ok(staff)
    }

    /// Delete a staff member.
    pub fn delete_staff(&self, id: &str) -> DbResult<bool> {
        self.conn
            .execute("DELETE FROM caretakers WHERE staff_id = ?", [id])?;
        let rows_affected = self.conn.execute("DELETE FROM staff WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Password digest for an active staff login.
    pub fn staff_credentials(&self, email: &str) -> DbResult<Option<Credentials>> {
        self.conn
            .query_row(
                "SELECT id, role, password_hash FROM staff WHERE email = ? AND active = 1",
                [email],
                |row| {
                    Ok(CredentialsRow {
                        account_id: row.get(0)?,
                        role: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Staff member by email, active or not.
    pub fn find_staff_by_email(&self, email: &str) -> DbResult<Option<Staff>> {
        self.conn
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE email = ?"),
                [email],
                staff_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    // =========================================================================
    // Caretakers
    // =========================================================================

    /// Get a caretaker with their assigned elders.
    pub fn get_caretaker(&self, staff_id: &str) -> DbResult<Option<Caretaker>> {
        let exists = self
            .conn
            .query_row(
                "SELECT staff_id FROM caretakers WHERE staff_id = ?",
                [staff_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let Some(staff_id) = exists else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT elder_id FROM caretaker_elders WHERE caretaker_id = ? ORDER BY assigned_at, elder_id",
        )?;
        let assigned_elders = stmt
            .query_map([&staff_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(Caretaker {
            staff_id,
            assigned_elders,
        }))
    }

    /// Add an elder to a caretaker's set. Re-adding is a no-op.
    pub fn link_caretaker_elder(&self, caretaker_id: &str, elder_id: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO caretaker_elders (caretaker_id, elder_id) VALUES (?, ?)",
            [caretaker_id, elder_id],
        )?;
        Ok(())
    }

    /// Remove an elder from a caretaker's set.
    pub fn unlink_caretaker_elder(&self, caretaker_id: &str, elder_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM caretaker_elders WHERE caretaker_id = ? AND elder_id = ?",
            [caretaker_id, elder_id],
        )?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub fn insert_session(&self, session: &Session) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (token_hash, account_id, role, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token_hash,
                session.account_id,
                session.role.as_str(),
                session.expires_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, token_hash: &str) -> DbResult<Option<Session>> {
        self.conn
            .query_row(
                "SELECT token_hash, account_id, role, expires_at FROM sessions WHERE token_hash = ?",
                [token_hash],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?
            .map(|(token_hash, account_id, role, expires_at)| {
                Ok(Session {
                    token_hash,
                    account_id,
                    role: string_to_role(&role)?,
                    expires_at,
                })
            })
            .transpose()
    }

    pub fn delete_session(&self, token_hash: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM sessions WHERE token_hash = ?", [token_hash])?;
        Ok(rows_affected > 0)
    }

    /// Drop every session for an account (e.g. when staff is deactivated).
    pub fn delete_sessions_for(&self, account_id: &str) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE account_id = ?", [account_id])?)
    }
}

/// Intermediate row struct for credential lookups.
struct CredentialsRow {
    account_id: String,
    role: String,
    password_hash: String,
}

impl TryFrom<CredentialsRow> for Credentials {
    type Error = DbError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(Credentials {
            account_id: row.account_id,
            role: string_to_role(&row.role)?,
            password_hash: row.password_hash,
        })
    }
}

fn guardian_from_row(row: &Row<'_>) -> rusqlite::Result<Guardian> {
    Ok(Guardian {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Intermediate row struct for staff lookups.
struct StaffRow {
    id: String,
    name: String,
    email: String,
    role: String,
    phone: Option<String>,
    specialization: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn staff_row(row: &Row<'_>) -> rusqlite::Result<StaffRow> {
    Ok(StaffRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        phone: row.get(4)?,
        specialization: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl TryFrom<StaffRow> for Staff {
    type Error = DbError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        Ok(Staff {
            id: row.id,
            name: row.name,
            email: row.email,
            role: string_to_role(&row.role)?,
            phone: row.phone,
            specialization: row.specialization,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn string_to_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Constraint(format!("Unknown role: {}", s)))
}

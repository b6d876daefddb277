//! SQLite schema definition.

/// Complete database schema for eldercare.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Accounts
-- ============================================================================

CREATE TABLE IF NOT EXISTS guardians (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    phone TEXT,
    address TEXT,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS staff (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role TEXT NOT NULL CHECK (role IN ('admin', 'operator', 'caretaker', 'doctor')),
    phone TEXT,
    specialization TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_staff_role ON staff(role);

-- One row per caretaker staff account
CREATE TABLE IF NOT EXISTS caretakers (
    staff_id TEXT PRIMARY KEY REFERENCES staff(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,                 -- SHA-256 of the bearer token
    account_id TEXT NOT NULL,
    role TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id);

-- ============================================================================
-- Elders & Payments
-- ============================================================================

CREATE TABLE IF NOT EXISTS elders (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    dob TEXT NOT NULL,
    gender TEXT,
    address TEXT,
    medical_notes TEXT,
    guardian_id TEXT NOT NULL REFERENCES guardians(id),
    caretaker_id TEXT REFERENCES caretakers(staff_id),
    status TEXT NOT NULL DEFAULT 'DISABLED_PENDING_REVIEW',
    payment_id TEXT,
    rejection_reason TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_elders_guardian ON elders(guardian_id);
CREATE INDEX IF NOT EXISTS idx_elders_status ON elders(status);
CREATE INDEX IF NOT EXISTS idx_elders_caretaker ON elders(caretaker_id);

-- Composite key keeps a caretaker's elder set deduplicated
CREATE TABLE IF NOT EXISTS caretaker_elders (
    caretaker_id TEXT NOT NULL REFERENCES caretakers(staff_id) ON DELETE CASCADE,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    assigned_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (caretaker_id, elder_id)
);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    guardian_id TEXT NOT NULL REFERENCES guardians(id),
    amount REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',      -- PENDING, SUCCESS, FAILED
    mock_checkout_url TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_payments_elder ON payments(elder_id);
CREATE INDEX IF NOT EXISTS idx_payments_status ON payments(status);

-- ============================================================================
-- Rooms
-- ============================================================================

CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    room_id TEXT NOT NULL UNIQUE,
    floor INTEGER NOT NULL,
    room_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'available'
        CHECK (status IN ('available', 'occupied', 'maintenance', 'reserved')),
    elder_id TEXT UNIQUE REFERENCES elders(id),  -- an elder occupies at most one room
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Care
-- ============================================================================

CREATE TABLE IF NOT EXISTS meals (
    id TEXT PRIMARY KEY,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    meal_type TEXT NOT NULL,
    menu TEXT NOT NULL,
    served_on TEXT NOT NULL,
    dietary_notes TEXT,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_meals_elder ON meals(elder_id, served_on);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    location TEXT,
    starts_at TEXT NOT NULL,
    capacity INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS event_enrollments (
    event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    enrolled_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (event_id, elder_id)
);

-- ============================================================================
-- Medical
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    id TEXT PRIMARY KEY,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    caretaker_id TEXT NOT NULL REFERENCES staff(id),
    doctor_id TEXT NOT NULL REFERENCES staff(id),
    reason TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Pending',      -- Pending, Approved, Rejected
    response_notes TEXT,
    appointment_id TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_consultations_doctor ON consultations(doctor_id, status);
CREATE INDEX IF NOT EXISTS idx_consultations_caretaker ON consultations(caretaker_id);

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    consultation_id TEXT UNIQUE REFERENCES consultations(id) ON DELETE CASCADE,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES staff(id),
    caretaker_id TEXT,
    scheduled_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'scheduled',    -- scheduled, completed, cancelled
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id, scheduled_at);

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    elder_id TEXT NOT NULL REFERENCES elders(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES staff(id),
    appointment_id TEXT REFERENCES appointments(id),
    medications TEXT NOT NULL DEFAULT '[]',      -- JSON array of Medication
    notes TEXT,
    issued_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_elder ON prescriptions(elder_id);

-- ============================================================================
-- Donations & Inventory
-- ============================================================================

CREATE TABLE IF NOT EXISTS donations (
    id TEXT PRIMARY KEY,
    donor_name TEXT NOT NULL,
    donor_email TEXT NOT NULL,
    donation_type TEXT NOT NULL CHECK (donation_type IN ('cash', 'item')),
    amount REAL,
    item_name TEXT,
    quantity INTEGER,
    status TEXT NOT NULL DEFAULT 'pending',      -- pending, received
    received_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_donations_status ON donations(status);

CREATE TABLE IF NOT EXISTS inventory (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    category TEXT,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    unit TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO guardians (id, name, email, password_hash)
            VALUES ('g1', 'Ann', 'ann@example.com', 'h');
            INSERT INTO elders (id, full_name, dob, guardian_id) VALUES ('e1', 'Jane', '1950-01-01', 'g1');
            INSERT INTO elders (id, full_name, dob, guardian_id) VALUES ('e2', 'John', '1948-05-05', 'g1');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
        // Idempotent on reopen
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_elder_occupies_one_room() {
        let conn = conn();
        conn.execute(
            "INSERT INTO rooms (id, room_id, floor, room_type, status, elder_id) VALUES ('r1', 'A-1', 1, 'single', 'occupied', 'e1')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO rooms (id, room_id, floor, room_type, status, elder_id) VALUES ('r2', 'A-2', 1, 'single', 'occupied', 'e1')",
            [],
        );
        assert!(result.is_err());

        // Many empty rooms are fine
        for (id, label) in [("r3", "A-3"), ("r4", "A-4")] {
            conn.execute(
                "INSERT INTO rooms (id, room_id, floor, room_type) VALUES (?1, ?2, 1, 'single')",
                [id, label],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_guardian_email_unique_case_insensitive() {
        let conn = conn();
        let result = conn.execute(
            "INSERT INTO guardians (id, name, email, password_hash) VALUES ('g2', 'Ann', 'ANN@example.com', 'h')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_inventory_quantity_non_negative() {
        let conn = conn();
        let result = conn.execute(
            "INSERT INTO inventory (id, name, quantity) VALUES ('i1', 'Blankets', -1)",
            [],
        );
        assert!(result.is_err());
    }
}

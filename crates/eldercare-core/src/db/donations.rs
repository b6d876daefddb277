//! Donation and inventory database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::elders::parse_status;
use super::{Database, DbError, DbResult};
use crate::models::{Donation, DonationStatus, DonationType, InventoryItem, Lifecycle};

const DONATION_COLUMNS: &str = "id, donor_name, donor_email, donation_type, amount, item_name, \
     quantity, status, received_at, created_at";

const INVENTORY_COLUMNS: &str = "id, name, category, quantity, unit, updated_at";

impl Database {
    // =========================================================================
    // Donations
    // =========================================================================

    pub fn insert_donation(&self, donation: &Donation) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO donations ({DONATION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                donation.id,
                donation.donor_name,
                donation.donor_email,
                donation.donation_type.as_str(),
                donation.amount,
                donation.item_name,
                donation.quantity,
                donation.status.as_str(),
                donation.received_at,
                donation.created_at,
            ],
        )?;
        Ok(())
    }

    /// Mark a donation received if it is still pending.
    ///
    /// Returns false when another caller already received it.
    pub fn mark_donation_received(&self, id: &str, received_at: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE donations SET status = ?2, received_at = ?3 WHERE id = ?1 AND status = ?4",
            params![
                id,
                DonationStatus::Received.as_str(),
                received_at,
                DonationStatus::Pending.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_donation(&self, id: &str) -> DbResult<Option<Donation>> {
        self.conn
            .query_row(
                &format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = ?"),
                [id],
                donation_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List donations, newest first, optionally filtered by status.
    pub fn list_donations(&self, status: Option<DonationStatus>) -> DbResult<Vec<Donation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([status.map(|s| s.as_str())], donation_row)?;

        let mut donations = Vec::new();
        for row in rows {
            donations.push(row?.try_into()?);
        }
        Ok(donations)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn insert_inventory_item(&self, item: &InventoryItem) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO inventory ({INVENTORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_inventory_item(&self, item: &InventoryItem) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE inventory SET
                name = ?2,
                category = ?3,
                quantity = ?4,
                unit = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit,
                item.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_inventory_item(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        self.conn
            .query_row(
                &format!("SELECT {INVENTORY_COLUMNS} FROM inventory WHERE id = ?"),
                [id],
                inventory_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Look up an item by name, ignoring case and surrounding whitespace.
    pub fn find_inventory_by_name(&self, name: &str) -> DbResult<Option<InventoryItem>> {
        self.conn
            .query_row(
                &format!("SELECT {INVENTORY_COLUMNS} FROM inventory WHERE name = ? COLLATE NOCASE"),
                [name.trim()],
                inventory_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    pub fn list_inventory(&self) -> DbResult<Vec<InventoryItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory ORDER BY name COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map([], inventory_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Add `amount` to an item's stock in place. False when the item is
    /// missing or the new stock would exceed `ceiling`.
    pub fn increment_inventory(&self, id: &str, amount: i64, ceiling: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE inventory SET quantity = quantity + ?2, updated_at = ?3
             WHERE id = ?1 AND quantity <= ?4 - ?2",
            params![id, amount, chrono::Utc::now().to_rfc3339(), ceiling],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn delete_inventory_item(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM inventory WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

struct DonationRow {
    id: String,
    donor_name: String,
    donor_email: String,
    donation_type: String,
    amount: Option<f64>,
    item_name: Option<String>,
    quantity: Option<i64>,
    status: String,
    received_at: Option<String>,
    created_at: String,
}

fn donation_row(row: &Row<'_>) -> rusqlite::Result<DonationRow> {
    Ok(DonationRow {
        id: row.get(0)?,
        donor_name: row.get(1)?,
        donor_email: row.get(2)?,
        donation_type: row.get(3)?,
        amount: row.get(4)?,
        item_name: row.get(5)?,
        quantity: row.get(6)?,
        status: row.get(7)?,
        received_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl TryFrom<DonationRow> for Donation {
    type Error = DbError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let donation_type = DonationType::parse(&row.donation_type).ok_or_else(|| {
            DbError::Constraint(format!("Unknown donation type: {}", row.donation_type))
        })?;
        Ok(Donation {
            id: row.id,
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            donation_type,
            amount: row.amount,
            item_name: row.item_name,
            quantity: row.quantity,
            status: parse_status(&row.status)?,
            received_at: row.received_at,
            created_at: row.created_at,
        })
    }
}

struct InventoryRow {
    id: String,
    name: String,
    category: Option<String>,
    quantity: i64,
    unit: Option<String>,
    updated_at: String,
}

fn inventory_row(row: &Row<'_>) -> rusqlite::Result<InventoryRow> {
    Ok(InventoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = DbError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: row.id,
            name: row.name,
            category: row.category,
            quantity: row.quantity,
            unit: row.unit,
            updated_at: row.updated_at,
        })
    }
}

//! Aggregate counts for the admin dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Database, DbResult};

/// Facility-wide counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Elder count keyed by status string
    pub elders_by_status: BTreeMap<String, i64>,
    pub rooms_by_status: BTreeMap<String, i64>,
    pub pending_consultations: i64,
    pub pending_donations: i64,
    pub received_cash_total: f64,
    pub inventory_items: i64,
}

impl Database {
    pub fn dashboard_stats(&self) -> DbResult<DashboardStats> {
        let pending_consultations = self.count("SELECT COUNT(*) FROM consultations WHERE status = 'Pending'")?;
        let pending_donations = self.count("SELECT COUNT(*) FROM donations WHERE status = 'pending'")?;
        let inventory_items = self.count("SELECT COUNT(*) FROM inventory")?;
        let received_cash_total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM donations WHERE donation_type = 'cash' AND status = 'received'",
            [],
            |row| row.get(0),
        )?;

        Ok(DashboardStats {
            elders_by_status: self.group_count("SELECT status, COUNT(*) FROM elders GROUP BY status")?,
            rooms_by_status: self.group_count("SELECT status, COUNT(*) FROM rooms GROUP BY status")?,
            pending_consultations,
            pending_donations,
            received_cash_total,
            inventory_items,
        })
    }

    fn count(&self, sql: &str) -> DbResult<i64> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    fn group_count(&self, sql: &str) -> DbResult<BTreeMap<String, i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }
}

//! Admin reporting: dashboard counters and CSV exports.

mod csv;

pub use csv::*;

use tracing::info;

use crate::db::{DashboardStats, Database};
use crate::models::Actor;
use crate::policy::{authorize, Action, Resource};
use crate::CoreResult;

pub struct ReportService<'a> {
    db: &'a Database,
}

impl<'a> ReportService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn dashboard(&self, actor: &Actor) -> CoreResult<DashboardStats> {
        authorize(actor, Resource::Dashboard, Action::Read)?;
        Ok(self.db.dashboard_stats()?)
    }

    /// Every elder, oldest submission first.
    pub fn elders_csv(&self, actor: &Actor) -> CoreResult<String> {
        authorize(actor, Resource::Dashboard, Action::Export)?;
        let elders = self.db.list_elders()?;
        info!(rows = elders.len(), "exporting elders");
        Ok(elders_to_csv(&elders))
    }

    pub fn donations_csv(&self, actor: &Actor) -> CoreResult<String> {
        authorize(actor, Resource::Dashboard, Action::Export)?;
        let donations = self.db.list_donations(None)?;
        info!(rows = donations.len(), "exporting donations");
        Ok(donations_to_csv(&donations))
    }
}

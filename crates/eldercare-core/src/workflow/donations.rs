//! Donations and inventory.

use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::info;

use super::{check_transition, ensure_written, required, Notification, NotificationKind, Transition};
use crate::db::Database;
use crate::models::{
    Actor, Donation, DonationStatus, DonationType, InventoryInput, InventoryItem, NewDonation,
};
use crate::policy::{authorize, Action, Resource};
use crate::{CoreError, CoreResult};

/// Minimum score for an inventory search hit.
const MIN_SEARCH_SCORE: f64 = 0.5;

/// Upper bound for a pledged quantity and for any stock level.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// One inventory search hit.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMatch {
    pub item: InventoryItem,
    pub score: f64,
}

pub struct DonationService<'a> {
    db: &'a Database,
}

impl<'a> DonationService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Public pledge form. No account needed.
    pub fn create(&self, request: NewDonation) -> CoreResult<Donation> {
        required(&request.donor_name, "donorName")?;
        if !request.donor_email.contains('@') {
            return Err(CoreError::BadRequest(format!(
                "Invalid donor email: {}",
                request.donor_email
            )));
        }
        match request.donation_type {
            DonationType::Cash => {
                if !request.amount.is_some_and(|a| a.is_finite() && a > 0.0) {
                    return Err(CoreError::BadRequest("Cash donations need an amount above 0".into()));
                }
            }
            DonationType::Item => {
                required(request.item_name.as_deref().unwrap_or(""), "itemName")?;
                if !request.quantity.is_some_and(|q| q > 0) {
                    return Err(CoreError::BadRequest("Item donations need a quantity above 0".into()));
                }
                quantity_in_range(request.quantity.unwrap_or_default())?;
            }
        }

        let donation = Donation::new(request);
        self.db.insert_donation(&donation)?;
        info!(
            donation_id = %donation.id,
            kind = donation.donation_type.as_str(),
            "donation pledged"
        );
        Ok(donation)
    }

    pub fn list(&self, actor: &Actor, status: Option<DonationStatus>) -> CoreResult<Vec<Donation>> {
        authorize(actor, Resource::Donation, Action::List)?;
        Ok(self.db.list_donations(status)?)
    }

    /// Mark a donation received. Item donations are added to stock in the
    /// same transaction, so a repeated call never counts twice.
    pub fn receive(&self, actor: &Actor, id: &str) -> CoreResult<Transition<Donation>> {
        authorize(actor, Resource::Donation, Action::Receive)?;
        let mut donation = self
            .db
            .get_donation(id)?
            .ok_or_else(|| CoreError::not_found("Donation", id))?;
        check_transition("Donation", donation.status, DonationStatus::Received)?;

        let received_at = chrono::Utc::now().to_rfc3339();
        let stocked = self.db.atomic(|db| -> CoreResult<Option<InventoryItem>> {
            ensure_written(db.mark_donation_received(id, &received_at)?, "Donation", id)?;
            let (Some(name), Some(quantity)) = (donation.item_name.as_deref(), donation.quantity) else {
                return Ok(None);
            };
            if donation.donation_type != DonationType::Item {
                return Ok(None);
            }
            let overflow = || {
                CoreError::Conflict(format!(
                    "Receiving {quantity} x {name} would exceed the stock limit of {MAX_QUANTITY}"
                ))
            };
            match db.find_inventory_by_name(name)? {
                Some(mut item) => {
                    let total = item
                        .quantity
                        .checked_add(quantity)
                        .filter(|total| *total <= MAX_QUANTITY)
                        .ok_or_else(overflow)?;
                    if !db.increment_inventory(&item.id, quantity, MAX_QUANTITY)? {
                        return Err(overflow());
                    }
                    item.quantity = total;
                    Ok(Some(item))
                }
                None => {
                    if !(0..=MAX_QUANTITY).contains(&quantity) {
                        return Err(overflow());
                    }
                    let item = InventoryItem::new(name.to_string(), quantity);
                    db.insert_inventory_item(&item)?;
                    Ok(Some(item))
                }
            }
        })?;

        donation.status = DonationStatus::Received;
        donation.received_at = Some(received_at);
        info!(
            donation_id = %id,
            stocked = stocked.as_ref().map(|i| i.name.as_str()).unwrap_or("-"),
            quantity = stocked.as_ref().map(|i| i.quantity).unwrap_or(0),
            "donation received"
        );

        let what = match donation.donation_type {
            DonationType::Cash => format!("{:.2}", donation.amount.unwrap_or_default()),
            DonationType::Item => format!(
                "{} x {}",
                donation.quantity.unwrap_or_default(),
                donation.item_name.as_deref().unwrap_or("items")
            ),
        };
        let notification = Notification::new(
            NotificationKind::DonationThanks,
            &donation.donor_email,
            "Thank you for your donation",
            format!("Dear {}, we have received your donation ({what}). Thank you!", donation.donor_name),
        );
        Ok(Transition::notify(donation, notification))
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn inventory(&self, actor: &Actor) -> CoreResult<Vec<InventoryItem>> {
        authorize(actor, Resource::Inventory, Action::List)?;
        Ok(self.db.list_inventory()?)
    }

    pub fn create_item(&self, actor: &Actor, input: InventoryInput) -> CoreResult<InventoryItem> {
        authorize(actor, Resource::Inventory, Action::Create)?;
        let name = required(input.name.as_deref().unwrap_or(""), "name")?;
        let quantity = quantity_in_range(input.quantity.unwrap_or(0))?;

        let mut item = InventoryItem::new(name, quantity);
        item.category = input.category;
        item.unit = input.unit;
        self.db.insert_inventory_item(&item).map_err(|e| match CoreError::from(e) {
            CoreError::Conflict(_) => CoreError::Conflict(format!("Inventory item {} already exists", item.name)),
            other => other,
        })?;
        info!(item = %item.name, quantity, "inventory item created");
        Ok(item)
    }

    pub fn update_item(&self, actor: &Actor, id: &str, input: InventoryInput) -> CoreResult<InventoryItem> {
        authorize(actor, Resource::Inventory, Action::Update)?;
        let mut item = self
            .db
            .get_inventory_item(id)?
            .ok_or_else(|| CoreError::not_found("Inventory item", id))?;

        if let Some(name) = input.name {
            item.name = required(&name, "name")?;
        }
        if let Some(quantity) = input.quantity {
            item.quantity = quantity_in_range(quantity)?;
        }
        if input.category.is_some() {
            item.category = input.category;
        }
        if input.unit.is_some() {
            item.unit = input.unit;
        }
        item.updated_at = chrono::Utc::now().to_rfc3339();

        self.db.update_inventory_item(&item)?;
        Ok(item)
    }

    pub fn delete_item(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        authorize(actor, Resource::Inventory, Action::Delete)?;
        if !self.db.delete_inventory_item(id)? {
            return Err(CoreError::not_found("Inventory item", id));
        }
        Ok(())
    }

    /// Rank inventory items by name similarity to `query`, best first.
    pub fn search(&self, actor: &Actor, query: &str, limit: usize) -> CoreResult<Vec<InventoryMatch>> {
        authorize(actor, Resource::Inventory, Action::List)?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<InventoryMatch> = self
            .db
            .list_inventory()?
            .into_iter()
            .map(|item| {
                let name = item.name.to_lowercase();
                let score = if name.contains(&query) {
                    1.0
                } else {
                    fuzzy_match(&query, &name)
                };
                InventoryMatch { item, score }
            })
            .filter(|m| m.score >= MIN_SEARCH_SCORE)
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);
        Ok(matches)
    }
}

fn quantity_in_range(quantity: i64) -> CoreResult<i64> {
    if quantity < 0 {
        Err(CoreError::BadRequest("quantity cannot be negative".into()))
    } else if quantity > MAX_QUANTITY {
        Err(CoreError::BadRequest(format!("quantity cannot exceed {MAX_QUANTITY}")))
    } else {
        Ok(quantity)
    }
}

/// Jaro-Winkler for typos and shared prefixes, blended with Levenshtein.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}

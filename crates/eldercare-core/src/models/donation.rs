//! Donations and the inventory they feed.

use serde::{Deserialize, Serialize};

use super::Lifecycle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DonationType {
    Cash,
    Item,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::Cash => "cash",
            DonationType::Item => "item",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(DonationType::Cash),
            "item" => Some(DonationType::Item),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Received,
}

impl Lifecycle for DonationStatus {
    const ALL: &'static [Self] = &[DonationStatus::Pending, DonationStatus::Received];

    fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Received => "received",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::Received)
        )
    }
}

/// A pledged donation of cash or goods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: String,
    pub donor_name: String,
    pub donor_email: String,
    pub donation_type: DonationType,
    /// Cash donations only
    pub amount: Option<f64>,
    /// Item donations only
    pub item_name: Option<String>,
    /// Item donations only
    pub quantity: Option<i64>,
    pub status: DonationStatus,
    pub received_at: Option<String>,
    pub created_at: String,
}

impl Donation {
    pub fn new(request: NewDonation) -> Self {
        Self {
            id: super::new_id(),
            donor_name: request.donor_name.trim().to_string(),
            donor_email: super::normalize_email(&request.donor_email),
            donation_type: request.donation_type,
            amount: request.amount,
            item_name: request.item_name.map(|n| n.trim().to_string()),
            quantity: request.quantity,
            status: DonationStatus::Pending,
            received_at: None,
            created_at: super::now(),
        }
    }
}

/// Public donation form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDonation {
    pub donor_name: String,
    pub donor_email: String,
    pub donation_type: DonationType,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// A stocked supply item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    /// Unique case-insensitively
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit: Option<String>,
    pub updated_at: String,
}

impl InventoryItem {
    pub fn new(name: String, quantity: i64) -> Self {
        Self {
            id: super::new_id(),
            name: name.trim().to_string(),
            category: None,
            quantity,
            unit: None,
            updated_at: super::now(),
        }
    }
}

/// Admin payload for creating or editing inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
}

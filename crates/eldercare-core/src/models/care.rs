//! Day-to-day care: meals and activity events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

/// A meal planned for an elder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub elder_id: String,
    pub meal_type: MealType,
    pub menu: String,
    /// YYYY-MM-DD
    pub served_on: String,
    pub dietary_notes: Option<String>,
    /// Staff who planned it
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMeal {
    pub elder_id: String,
    pub meal_type: MealType,
    pub menu: String,
    pub served_on: String,
    #[serde(default)]
    pub dietary_notes: Option<String>,
}

/// An activity elders can be enrolled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// RFC 3339
    pub starts_at: String,
    /// `None` means unlimited
    pub capacity: Option<i64>,
    /// Deduplicated elder IDs
    pub enrolled: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Admin payload for creating or editing an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
}

impl Event {
    /// Whether another elder can join.
    pub fn has_room(&self) -> bool {
        self.capacity
            .map(|cap| (self.enrolled.len() as i64) < cap)
            .unwrap_or(true)
    }
}

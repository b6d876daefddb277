//! Rooms and occupancy.

use serde::{Deserialize, Serialize};

/// Occupancy status of a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

impl RoomStatus {
    pub const ALL: [RoomStatus; 4] = [
        RoomStatus::Available,
        RoomStatus::Occupied,
        RoomStatus::Maintenance,
        RoomStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::Reserved => "reserved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// A room in the facility. Holds at most one elder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    /// Human-facing room label (e.g. "A-101"), unique
    pub room_id: String,
    pub floor: i64,
    #[serde(rename = "type")]
    pub room_type: String,
    pub status: RoomStatus,
    /// Occupant, if any
    pub elder_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Room {
    pub fn new(room_id: String, floor: i64, room_type: String) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            room_id,
            floor,
            room_type,
            status: RoomStatus::Available,
            elder_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether `elder_id` may be placed here.
    pub fn accepts(&self, elder_id: &str) -> bool {
        match &self.elder_id {
            Some(current) => current == elder_id,
            None => self.status == RoomStatus::Available,
        }
    }
}

/// Admin payload for creating a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    pub room_id: String,
    pub floor: i64,
    #[serde(rename = "type")]
    pub room_type: String,
}

/// Admin payload for editing a room. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    #[serde(default)]
    pub floor: Option<i64>,
    #[serde(default, rename = "type")]
    pub room_type: Option<String>,
    #[serde(default)]
    pub status: Option<RoomStatus>,
}

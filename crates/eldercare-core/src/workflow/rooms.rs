//! Rooms and occupancy.

use tracing::info;

use super::required;
use crate::db::Database;
use crate::models::{Actor, Elder, NewRoom, Role, Room, RoomStatus, RoomUpdate};
use crate::policy::{authorize, Action, Resource};
use crate::{CoreError, CoreResult};

pub struct RoomService<'a> {
    db: &'a Database,
}

impl<'a> RoomService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn load(&self, id: &str) -> CoreResult<Room> {
        self.db
            .get_room(id)?
            .ok_or_else(|| CoreError::not_found("Room", id))
    }

    /// Caretakers may only handle their own elders.
    fn require_carer(actor: &Actor, elder: &Elder) -> CoreResult<()> {
        if actor.role == Role::Caretaker && elder.caretaker_id.as_deref() != Some(actor.account_id.as_str()) {
            return Err(CoreError::Forbidden(format!(
                "Elder {} is not assigned to you",
                elder.id
            )));
        }
        Ok(())
    }

    pub fn list(&self, actor: &Actor) -> CoreResult<Vec<Room>> {
        authorize(actor, Resource::Room, Action::List)?;
        Ok(self.db.list_rooms()?)
    }

    pub fn create(&self, actor: &Actor, request: NewRoom) -> CoreResult<Room> {
        authorize(actor, Resource::Room, Action::Create)?;
        let label = required(&request.room_id, "roomId")?;
        let room_type = required(&request.room_type, "type")?;

        let room = Room::new(label, request.floor, room_type);
        self.db.insert_room(&room).map_err(|e| match CoreError::from(e) {
            CoreError::Conflict(_) => CoreError::Conflict(format!("Room {} already exists", room.room_id)),
            other => other,
        })?;
        info!(room_id = %room.room_id, "room created");
        Ok(room)
    }

    /// Edit an empty room. Occupancy only changes through assign/release.
    pub fn update(&self, actor: &Actor, id: &str, update: RoomUpdate) -> CoreResult<Room> {
        authorize(actor, Resource::Room, Action::Update)?;
        if update.status == Some(RoomStatus::Occupied) {
            return Err(CoreError::BadRequest(
                "Rooms become occupied by assigning an elder".into(),
            ));
        }
        let mut room = self.load(id)?;
        if room.elder_id.is_some() || room.status == RoomStatus::Occupied {
            return Err(CoreError::Conflict(format!("Room {} is occupied", room.room_id)));
        }

        if let Some(floor) = update.floor {
            room.floor = floor;
        }
        if let Some(room_type) = update.room_type {
            room.room_type = required(&room_type, "type")?;
        }
        if let Some(status) = update.status {
            room.status = status;
        }
        room.updated_at = chrono::Utc::now().to_rfc3339();

        self.db.update_room(&room)?;
        info!(room_id = %room.room_id, status = room.status.as_str(), "room updated");
        Ok(room)
    }

    pub fn delete(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        authorize(actor, Resource::Room, Action::Delete)?;
        let room = self.load(id)?;
        if room.elder_id.is_some() {
            return Err(CoreError::Conflict(format!("Room {} is occupied", room.room_id)));
        }
        self.db.delete_room(id)?;
        info!(room_id = %room.room_id, "room deleted");
        Ok(())
    }

    /// Place an admitted elder in a room, vacating any room they held before.
    pub fn assign(&self, actor: &Actor, room_id: &str, elder_id: &str) -> CoreResult<Room> {
        authorize(actor, Resource::Room, Action::Assign)?;
        let mut room = self.load(room_id)?;
        let elder = self
            .db
            .get_elder(elder_id)?
            .ok_or_else(|| CoreError::not_found("Elder", elder_id))?;
        Self::require_carer(actor, &elder)?;

        if !elder.status.is_admitted() {
            return Err(CoreError::InvalidState(format!(
                "Elder {elder_id} must be admitted before getting a room"
            )));
        }
        if !room.accepts(elder_id) {
            return Err(CoreError::Conflict(format!(
                "Room {} is {}",
                room.room_id,
                room.status.as_str()
            )));
        }

        room.elder_id = Some(elder_id.to_string());
        room.status = RoomStatus::Occupied;
        room.updated_at = chrono::Utc::now().to_rfc3339();

        let released = self.db.atomic(|db| -> CoreResult<usize> {
            let released = db.release_rooms_for_elder(elder_id, Some(&room.id))?;
            db.update_room(&room)?;
            Ok(released)
        })?;
        info!(
            room_id = %room.room_id,
            elder_id = %elder_id,
            released,
            "room assigned"
        );
        Ok(room)
    }

    /// Vacate a room.
    pub fn release(&self, actor: &Actor, room_id: &str) -> CoreResult<Room> {
        authorize(actor, Resource::Room, Action::Release)?;
        let mut room = self.load(room_id)?;
        let Some(elder_id) = room.elder_id.clone() else {
            return Err(CoreError::Conflict(format!("Room {} is not occupied", room.room_id)));
        };
        if let Some(elder) = self.db.get_elder(&elder_id)? {
            Self::require_carer(actor, &elder)?;
        }

        self.db.release_rooms_for_elder(&elder_id, None)?;
        room.elder_id = None;
        room.status = RoomStatus::Available;
        info!(room_id = %room.room_id, elder_id = %elder_id, "room released");
        Ok(self.db.get_room(room_id)?.unwrap_or(room))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing;

    struct Fixture {
        db: Database,
        admin: Actor,
        guardian: Actor,
        caretaker: Actor,
    }

    impl Fixture {
        fn new() -> Self {
            let db = Database::open_in_memory().unwrap();
            let admin = testing::admin(&db);
            let guardian = testing::guardian(&db, "ann@example.com");
            let caretaker = testing::staff(&db, "cara@care.org", Role::Caretaker);
            Self {
                db,
                admin,
                guardian,
                caretaker,
            }
        }

        fn room(&self, label: &str) -> Room {
            RoomService::new(&self.db)
                .create(
                    &self.admin,
                    NewRoom {
                        room_id: label.into(),
                        floor: 1,
                        room_type: "single".into(),
                    },
                )
                .unwrap()
        }
    }

    #[test]
    fn test_reassignment_frees_old_room() {
        let f = Fixture::new();
        let rooms = RoomService::new(&f.db);
        let elder = testing::cared_elder(&f.db, &f.guardian, &f.caretaker, "Jane");
        let r1 = f.room("A-101");
        let r2 = f.room("A-102");

        rooms.assign(&f.caretaker, &r1.id, &elder).unwrap();
        // Same elder again is fine
        rooms.assign(&f.caretaker, &r1.id, &elder).unwrap();

        let moved = rooms.assign(&f.caretaker, &r2.id, &elder).unwrap();
        assert_eq!(moved.status, RoomStatus::Occupied);
        assert_eq!(moved.elder_id.as_deref(), Some(elder.as_str()));

        let old = f.db.get_room(&r1.id).unwrap().unwrap();
        assert_eq!(old.status, RoomStatus::Available);
        assert!(old.elder_id.is_none());
    }

    #[test]
    fn test_occupied_room_conflicts() {
        let f = Fixture::new();
        let rooms = RoomService::new(&f.db);
        let jane = testing::cared_elder(&f.db, &f.guardian, &f.caretaker, "Jane");
        let john = testing::cared_elder(&f.db, &f.guardian, &f.caretaker, "John");
        let r1 = f.room("A-101");

        rooms.assign(&f.admin, &r1.id, &jane).unwrap();
        assert!(matches!(
            rooms.assign(&f.admin, &r1.id, &john),
            Err(CoreError::Conflict(_))
        ));

        let mut maintenance = f.room("A-102");
        maintenance = rooms
            .update(
                &f.admin,
                &maintenance.id,
                RoomUpdate {
                    status: Some(RoomStatus::Maintenance),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(matches!(
            rooms.assign(&f.admin, &maintenance.id, &john),
            Err(CoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_caretaker_limited_to_assigned_elders() {
        let f = Fixture::new();
        let other = testing::staff(&f.db, "other@care.org", Role::Caretaker);
        let elder = testing::cared_elder(&f.db, &f.guardian, &f.caretaker, "Jane");
        let r1 = f.room("A-101");

        assert!(matches!(
            RoomService::new(&f.db).assign(&other, &r1.id, &elder),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_unadmitted_elder_cannot_be_placed() {
        let f = Fixture::new();
        let settings = crate::workflow::WorkflowSettings::default();
        let pending = crate::workflow::ElderService::new(&f.db, &settings)
            .submit(&f.guardian, testing::elder_request("Jane"))
            .unwrap();
        let r1 = f.room("A-101");

        assert!(matches!(
            RoomService::new(&f.db).assign(&f.admin, &r1.id, &pending.id),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_admin_edits_and_release() {
        let f = Fixture::new();
        let rooms = RoomService::new(&f.db);
        let elder = testing::cared_elder(&f.db, &f.guardian, &f.caretaker, "Jane");
        let r1 = f.room("A-101");

        assert!(matches!(
            rooms.update(
                &f.admin,
                &r1.id,
                RoomUpdate {
                    status: Some(RoomStatus::Occupied),
                    ..Default::default()
                }
            ),
            Err(CoreError::BadRequest(_))
        ));

        rooms.assign(&f.caretaker, &r1.id, &elder).unwrap();
        assert!(matches!(
            rooms.update(&f.admin, &r1.id, RoomUpdate::default()),
            Err(CoreError::Conflict(_))
        ));
        assert!(matches!(rooms.delete(&f.admin, &r1.id), Err(CoreError::Conflict(_))));

        let released = rooms.release(&f.caretaker, &r1.id).unwrap();
        assert_eq!(released.status, RoomStatus::Available);
        assert!(released.elder_id.is_none());
        assert!(matches!(
            rooms.release(&f.caretaker, &r1.id),
            Err(CoreError::Conflict(_))
        ));

        rooms.delete(&f.admin, &r1.id).unwrap();
        assert!(f.db.get_room(&r1.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_label_conflicts() {
        let f = Fixture::new();
        f.room("A-101");
        let err = RoomService::new(&f.db)
            .create(
                &f.admin,
                NewRoom {
                    room_id: "A-101".into(),
                    floor: 2,
                    room_type: "double".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}

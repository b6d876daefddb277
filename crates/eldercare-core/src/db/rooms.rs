//! Room database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Room, RoomStatus};

const ROOM_COLUMNS: &str = "id, room_id, floor, room_type, status, elder_id, created_at, updated_at";

impl Database {
    pub fn insert_room(&self, room: &Room) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO rooms ({ROOM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                room.id,
                room.room_id,
                room.floor,
                room.room_type,
                room.status.as_str(),
                room.elder_id,
                room.created_at,
                room.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Write every mutable column of a room.
    pub fn update_room(&self, room: &Room) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE rooms SET
                floor = ?2,
                room_type = ?3,
                status = ?4,
                elder_id = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                room.id,
                room.floor,
                room.room_type,
                room.status.as_str(),
                room.elder_id,
                room.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_room(&self, id: &str) -> DbResult<Option<Room>> {
        self.conn
            .query_row(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?"),
                [id],
                room_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// The room an elder currently occupies, if any.
    pub fn get_room_for_elder(&self, elder_id: &str) -> DbResult<Option<Room>> {
        self.conn
            .query_row(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE elder_id = ?"),
                [elder_id],
                room_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    pub fn list_rooms(&self) -> DbResult<Vec<Room>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY floor, room_id"))?;
        let rows = stmt.query_map([], room_row)?;

        let mut rooms = Vec::new();
        for row in rows {
            rooms.push(row?.try_into()?);
        }
        Ok(rooms)
    }

    /// Clear the occupant of every room holding `elder_id` except `keep_room`.
    /// Returns how many rooms were released.
    pub fn release_rooms_for_elder(&self, elder_id: &str, keep_room: Option<&str>) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE rooms SET
                status = 'available',
                elder_id = NULL,
                updated_at = ?3
            WHERE elder_id = ?1 AND (?2 IS NULL OR id != ?2)
            "#,
            params![elder_id, keep_room, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected)
    }

    pub fn delete_room(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM rooms WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

struct RoomRow {
    id: String,
    room_id: String,
    floor: i64,
    room_type: String,
    status: String,
    elder_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn room_row(row: &Row<'_>) -> rusqlite::Result<RoomRow> {
    Ok(RoomRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        floor: row.get(2)?,
        room_type: row.get(3)?,
        status: row.get(4)?,
        elder_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl TryFrom<RoomRow> for Room {
    type Error = DbError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        let status = RoomStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown room status: {}", row.status)))?;
        Ok(Room {
            id: row.id,
            room_id: row.room_id,
            floor: row.floor,
            room_type: row.room_type,
            status,
            elder_id: row.elder_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                r#"
                INSERT INTO guardians (id, name, email, password_hash)
                VALUES ('g1', 'Ann', 'ann@example.com', 'h');
                INSERT INTO elders (id, full_name, dob, guardian_id) VALUES ('e1', 'Jane', '1950-01-01', 'g1');
                "#,
            )
            .unwrap();
        db
    }

    #[test]
    fn test_insert_and_list_rooms() {
        let db = setup_db();
        db.insert_room(&Room::new("B-201".into(), 2, "double".into()))
            .unwrap();
        db.insert_room(&Room::new("A-101".into(), 1, "single".into()))
            .unwrap();

        let rooms = db.list_rooms().unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_id, "A-101");
    }

    #[test]
    fn test_duplicate_room_label_rejected() {
        let db = setup_db();
        db.insert_room(&Room::new("A-101".into(), 1, "single".into()))
            .unwrap();
        let err = db
            .insert_room(&Room::new("A-101".into(), 1, "double".into()))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_release_rooms_for_elder() {
        let db = setup_db();
        let mut room = Room::new("A-101".into(), 1, "single".into());
        room.elder_id = Some("e1".into());
        room.status = RoomStatus::Occupied;
        db.insert_room(&room).unwrap();

        assert_eq!(db.get_room_for_elder("e1").unwrap().unwrap().id, room.id);

        // Keeping the same room releases nothing
        assert_eq!(db.release_rooms_for_elder("e1", Some(&room.id)).unwrap(), 0);
        assert_eq!(db.release_rooms_for_elder("e1", None).unwrap(), 1);

        let released = db.get_room(&room.id).unwrap().unwrap();
        assert_eq!(released.status, RoomStatus::Available);
        assert!(released.elder_id.is_none());
        assert!(db.get_room_for_elder("e1").unwrap().is_none());
    }
}

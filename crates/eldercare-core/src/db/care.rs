//! Meal and event database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Event, Meal, MealType};

const MEAL_COLUMNS: &str =
    "id, elder_id, meal_type, menu, served_on, dietary_notes, created_by, created_at";

const EVENT_COLUMNS: &str =
    "id, title, description, location, starts_at, capacity, created_at, updated_at";

impl Database {
    // =========================================================================
    // Meals
    // =========================================================================

    pub fn insert_meal(&self, meal: &Meal) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO meals ({MEAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                meal.id,
                meal.elder_id,
                meal.meal_type.as_str(),
                meal.menu,
                meal.served_on,
                meal.dietary_notes,
                meal.created_by,
                meal.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_meal(&self, id: &str) -> DbResult<Option<Meal>> {
        self.conn
            .query_row(
                &format!("SELECT {MEAL_COLUMNS} FROM meals WHERE id = ?"),
                [id],
                meal_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Meals for the given elders, by serving date.
    pub fn list_meals_for_elders(&self, elder_ids: &[String]) -> DbResult<Vec<Meal>> {
        let mut meals: Vec<Meal> = Vec::new();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE elder_id = ? ORDER BY served_on, created_at"
        ))?;
        for elder_id in elder_ids {
            let rows = stmt.query_map([elder_id], meal_row)?;
            for row in rows {
                meals.push(row?.try_into()?);
            }
        }
        meals.sort_by(|a, b| a.served_on.cmp(&b.served_on));
        Ok(meals)
    }

    pub fn list_meals(&self) -> DbResult<Vec<Meal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals ORDER BY served_on, created_at"
        ))?;
        let rows = stmt.query_map([], meal_row)?;

        let mut meals = Vec::new();
        for row in rows {
            meals.push(row?.try_into()?);
        }
        Ok(meals)
    }

    pub fn delete_meal(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM meals WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn insert_event(&self, event: &Event) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                event.id,
                event.title,
                event.description,
                event.location,
                event.starts_at,
                event.capacity,
                event.created_at,
                event.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_event(&self, event: &Event) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE events SET
                title = ?2,
                description = ?3,
                location = ?4,
                starts_at = ?5,
                capacity = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                event.id,
                event.title,
                event.description,
                event.location,
                event.starts_at,
                event.capacity,
                event.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an event with its enrolled elders.
    pub fn get_event(&self, id: &str) -> DbResult<Option<Event>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"),
                [id],
                event_row,
            )
            .optional()?;

        match row {
            Some(row) => {
                let enrolled = self.enrolled_elders(&row.id)?;
                Ok(Some(row.into_event(enrolled)))
            }
            None => Ok(None),
        }
    }

    pub fn list_events(&self) -> DbResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at"))?;
        let rows = stmt
            .query_map([], event_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let enrolled = self.enrolled_elders(&row.id)?;
            events.push(row.into_event(enrolled));
        }
        Ok(events)
    }

    pub fn delete_event(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM events WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Enroll an elder. Returns false if they were already enrolled.
    pub fn enroll_elder(&self, event_id: &str, elder_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "INSERT OR IGNORE INTO event_enrollments (event_id, elder_id) VALUES (?1, ?2)",
            [event_id, elder_id],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn unenroll_elder(&self, event_id: &str, elder_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM event_enrollments WHERE event_id = ?1 AND elder_id = ?2",
            [event_id, elder_id],
        )?;
        Ok(rows_affected > 0)
    }

    fn enrolled_elders(&self, event_id: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT elder_id FROM event_enrollments WHERE event_id = ? ORDER BY enrolled_at, elder_id",
        )?;
        let ids = stmt
            .query_map([event_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

struct MealRow {
    id: String,
    elder_id: String,
    meal_type: String,
    menu: String,
    served_on: String,
    dietary_notes: Option<String>,
    created_by: String,
    created_at: String,
}

fn meal_row(row: &Row<'_>) -> rusqlite::Result<MealRow> {
    Ok(MealRow {
        id: row.get(0)?,
        elder_id: row.get(1)?,
        meal_type: row.get(2)?,
        menu: row.get(3)?,
        served_on: row.get(4)?,
        dietary_notes: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl TryFrom<MealRow> for Meal {
    type Error = DbError;

    fn try_from(row: MealRow) -> Result<Self, Self::Error> {
        let meal_type = MealType::parse(&row.meal_type)
            .ok_or_else(|| DbError::Constraint(format!("Unknown meal type: {}", row.meal_type)))?;
        Ok(Meal {
            id: row.id,
            elder_id: row.elder_id,
            meal_type,
            menu: row.menu,
            served_on: row.served_on,
            dietary_notes: row.dietary_notes,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    starts_at: String,
    capacity: Option<i64>,
    created_at: String,
    updated_at: String,
}

fn event_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        starts_at: row.get(4)?,
        capacity: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl EventRow {
    fn into_event(self, enrolled: Vec<String>) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            capacity: self.capacity,
            enrolled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

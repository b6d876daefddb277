//! Meals and activity events.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::required;
use crate::db::Database;
use crate::models::{Actor, Elder, ElderStatus, Event, EventInput, Meal, NewMeal, Role};
use crate::policy::{authorize, Action, Resource};
use crate::{CoreError, CoreResult};

pub struct CareService<'a> {
    db: &'a Database,
}

impl<'a> CareService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn load_elder(&self, id: &str) -> CoreResult<Elder> {
        self.db
            .get_elder(id)?
            .ok_or_else(|| CoreError::not_found("Elder", id))
    }

    fn load_event(&self, id: &str) -> CoreResult<Event> {
        self.db
            .get_event(id)?
            .ok_or_else(|| CoreError::not_found("Event", id))
    }

    /// Caretakers handle their own elders, guardians only see theirs.
    fn require_access(actor: &Actor, elder: &Elder) -> CoreResult<()> {
        let allowed = match actor.role {
            Role::Caretaker => elder.caretaker_id.as_deref() == Some(actor.account_id.as_str()),
            Role::Guardian => actor.is(&elder.guardian_id),
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("No access to elder {}", elder.id)))
        }
    }

    // =========================================================================
    // Meals
    // =========================================================================

    pub fn create_meal(&self, actor: &Actor, request: NewMeal) -> CoreResult<Meal> {
        authorize(actor, Resource::Meal, Action::Create)?;
        let elder = self.load_elder(&request.elder_id)?;
        Self::require_access(actor, &elder)?;

        let menu = required(&request.menu, "menu")?;
        let served_on = request.served_on.trim();
        NaiveDate::parse_from_str(served_on, "%Y-%m-%d")
            .map_err(|_| CoreError::BadRequest(format!("servedOn must be YYYY-MM-DD: {served_on}")))?;

        let meal = Meal {
            id: uuid::Uuid::new_v4().to_string(),
            elder_id: elder.id,
            meal_type: request.meal_type,
            menu,
            served_on: served_on.to_string(),
            dietary_notes: request.dietary_notes,
            created_by: actor.account_id.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.db.insert_meal(&meal)?;
        info!(meal_id = %meal.id, elder_id = %meal.elder_id, "meal planned");
        Ok(meal)
    }

    pub fn meals_for_elder(&self, actor: &Actor, elder_id: &str) -> CoreResult<Vec<Meal>> {
        authorize(actor, Resource::Meal, Action::Read)?;
        let elder = self.load_elder(elder_id)?;
        Self::require_access(actor, &elder)?;
        Ok(self.db.list_meals_for_elders(&[elder.id])?)
    }

    pub fn delete_meal(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        authorize(actor, Resource::Meal, Action::Delete)?;
        let meal = self
            .db
            .get_meal(id)?
            .ok_or_else(|| CoreError::not_found("Meal", id))?;
        if let Some(elder) = self.db.get_elder(&meal.elder_id)? {
            Self::require_access(actor, &elder)?;
        }
        self.db.delete_meal(id)?;
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn events(&self, actor: &Actor) -> CoreResult<Vec<Event>> {
        authorize(actor, Resource::Event, Action::List)?;
        Ok(self.db.list_events()?)
    }

    pub fn create_event(&self, actor: &Actor, input: EventInput) -> CoreResult<Event> {
        authorize(actor, Resource::Event, Action::Create)?;
        let title = required(input.title.as_deref().unwrap_or(""), "title")?;
        let starts_at = parse_start(input.starts_at.as_deref().unwrap_or(""))?;
        let capacity = input.capacity.map(positive_capacity).transpose()?;

        let now = Utc::now().to_rfc3339();
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: input.description,
            location: input.location,
            starts_at,
            capacity,
            enrolled: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.db.insert_event(&event)?;
        info!(event_id = %event.id, title = %event.title, "event created");
        Ok(event)
    }

    pub fn update_event(&self, actor: &Actor, id: &str, input: EventInput) -> CoreResult<Event> {
        authorize(actor, Resource::Event, Action::Update)?;
        let mut event = self.load_event(id)?;

        if let Some(title) = input.title {
            event.title = required(&title, "title")?;
        }
        if let Some(starts_at) = input.starts_at {
            event.starts_at = parse_start(&starts_at)?;
        }
        if let Some(capacity) = input.capacity {
            let capacity = positive_capacity(capacity)?;
            if (event.enrolled.len() as i64) > capacity {
                return Err(CoreError::Conflict(format!(
                    "Event {id} already has {} elders enrolled",
                    event.enrolled.len()
                )));
            }
            event.capacity = Some(capacity);
        }
        if input.description.is_some() {
            event.description = input.description;
        }
        if input.location.is_some() {
            event.location = input.location;
        }
        event.updated_at = Utc::now().to_rfc3339();

        self.db.update_event(&event)?;
        Ok(event)
    }

    pub fn delete_event(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        authorize(actor, Resource::Event, Action::Delete)?;
        if !self.db.delete_event(id)? {
            return Err(CoreError::not_found("Event", id));
        }
        info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// Enroll an active elder. Enrolling twice is a no-op.
    pub fn enroll(&self, actor: &Actor, event_id: &str, elder_id: &str) -> CoreResult<Event> {
        authorize(actor, Resource::Event, Action::Enroll)?;
        let elder = self.load_elder(elder_id)?;
        Self::require_access(actor, &elder)?;
        if elder.status != ElderStatus::Active {
            return Err(CoreError::Conflict(format!(
                "Elder {elder_id} is not active"
            )));
        }

        self.db.atomic(|db| -> CoreResult<()> {
            let event = db
                .get_event(event_id)?
                .ok_or_else(|| CoreError::not_found("Event", event_id))?;
            if event.enrolled.iter().any(|id| id == elder_id) {
                return Ok(());
            }
            if !event.has_room() {
                return Err(CoreError::Conflict(format!("Event {} is full", event.title)));
            }
            db.enroll_elder(event_id, elder_id)?;
            Ok(())
        })?;
        info!(event_id = %event_id, elder_id = %elder_id, "elder enrolled");
        self.load_event(event_id)
    }

    pub fn unenroll(&self, actor: &Actor, event_id: &str, elder_id: &str) -> CoreResult<Event> {
        authorize(actor, Resource::Event, Action::Enroll)?;
        let elder = self.load_elder(elder_id)?;
        Self::require_access(actor, &elder)?;
        let event = self.load_event(event_id)?;
        if !self.db.unenroll_elder(&event.id, elder_id)? {
            return Err(CoreError::NotFound(format!(
                "Elder {elder_id} is not enrolled in event {event_id}"
            )));
        }
        self.load_event(event_id)
    }
}

fn parse_start(value: &str) -> CoreResult<String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc).to_rfc3339())
        .map_err(|_| CoreError::BadRequest(format!("startsAt must be RFC 3339: {value}")))
}

fn positive_capacity(capacity: i64) -> CoreResult<i64> {
    if capacity < 1 {
        Err(CoreError::BadRequest("capacity must be at least 1".into()))
    } else {
        Ok(capacity)
    }
}

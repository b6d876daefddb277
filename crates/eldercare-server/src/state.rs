//! Shared application state.

use std::sync::{Arc, Mutex, PoisonError};

use eldercare_core::workflow::{ElderService, WorkflowSettings};
use eldercare_core::{CoreResult, Database, Notification};

use crate::dispatch::{Dispatcher, Notifier};
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    pub settings: Arc<WorkflowSettings>,
    pub session_ttl_hours: i64,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        db: Database,
        settings: WorkflowSettings,
        session_ttl_hours: i64,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            settings: Arc::new(settings),
            session_ttl_hours,
            dispatcher: Dispatcher::new(notifier),
        }
    }

    /// Run one store operation under the database lock on the blocking pool.
    ///
    /// A panicking call comes back as [`ApiError::Internal`]. The lock it
    /// poisoned is recovered on the next call: any transaction it held open
    /// was rolled back when dropped during unwinding.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> CoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let outcome = tokio::task::spawn_blocking(move || {
            let db = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&db)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?;
        Ok(outcome?)
    }

    /// [`with_db`](Self::with_db) with an [`ElderService`] on the configured settings.
    pub async fn with_elders<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(ElderService<'_>) -> CoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let settings = Arc::clone(&self.settings);
        self.with_db(move |db| f(ElderService::new(db, &settings))).await
    }

    pub fn dispatch(&self, notifications: Vec<Notification>) {
        self.dispatcher.dispatch(notifications);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::LogNotifier;
    use axum::http::StatusCode;
    use eldercare_core::models::{Guardian, NewGuardian};
    use eldercare_core::workflow::AccountService;

    fn state() -> AppState {
        AppState::new(
            Database::open_in_memory().unwrap(),
            WorkflowSettings::default(),
            24,
            Arc::new(LogNotifier),
        )
    }

    fn ann(email: &str) -> NewGuardian {
        NewGuardian {
            name: "Ann".into(),
            email: email.into(),
            password: "correct-horse".into(),
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_panicking_call_leaves_store_usable() {
        let state = state();

        let err = state
            .with_db(|_| -> CoreResult<()> { panic!("store call blew up") })
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let guardian = state
            .with_db(|db| AccountService::new(db).register_guardian(ann("ann@example.com")))
            .await
            .unwrap();
        assert_eq!(guardian.email, "ann@example.com");
    }

    #[tokio::test]
    async fn test_panic_inside_transaction_rolls_back() {
        let state = state();

        let err = state
            .with_db(|db| {
                db.atomic(|db| -> CoreResult<()> {
                    db.insert_guardian(&Guardian::new("Ann".into(), "ann@example.com".into()), "h")?;
                    panic!("store call blew up mid-transaction")
                })
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let found = state
            .with_db(|db| Ok(db.guardian_credentials("ann@example.com")?))
            .await
            .unwrap();
        assert!(found.is_none());

        // The email is free again
        state
            .with_db(|db| AccountService::new(db).register_guardian(ann("ann@example.com")))
            .await
            .unwrap();
    }
}

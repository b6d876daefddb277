//! Registration, login sessions and staff administration.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::required;
use crate::db::Database;
use crate::models::{
    normalize_email, Actor, Guardian, LoginRequest, NewGuardian, NewStaff, Profile, Role, Session,
    Staff, StaffUpdate,
};
use crate::policy::{authorize, Action, Resource};
use crate::{CoreError, CoreResult};

const MIN_PASSWORD_LEN: usize = 8;
const DEFAULT_SESSION_HOURS: i64 = 24;

/// Longest session lifetime accepted, ten years.
pub const MAX_SESSION_HOURS: i64 = 24 * 365 * 10;

/// Which account table a login is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Guardian,
    Staff,
}

/// A successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    /// Opaque bearer token. Only its digest is stored.
    pub token: String,
    pub expires_at: String,
    pub role: Role,
    pub profile: Profile,
}

/// Argon2id hash of a password as a PHC string. The salt is embedded.
pub fn hash_password(password: &str) -> CoreResult<String> {
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|e| CoreError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// SHA-256 of a bearer token, hex encoded.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn check_email(email: &str) -> CoreResult<String> {
    let email = normalize_email(email);
    if email.contains('@') {
        Ok(email)
    } else {
        Err(CoreError::BadRequest(format!("Invalid email: {email}")))
    }
}

fn check_password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Account operations.
pub struct AccountService<'a> {
    db: &'a Database,
    /// `None` when the configured hours do not fit a `TimeDelta`
    session_ttl: Option<TimeDelta>,
}

impl<'a> AccountService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            session_ttl: TimeDelta::try_hours(DEFAULT_SESSION_HOURS),
        }
    }

    pub fn with_session_ttl(mut self, hours: i64) -> Self {
        self.session_ttl = TimeDelta::try_hours(hours);
        self
    }

    // =========================================================================
    // Guardians
    // =========================================================================

    /// Public sign-up. Duplicate emails are a `Conflict`.
    pub fn register_guardian(&self, request: NewGuardian) -> CoreResult<Guardian> {
        let name = required(&request.name, "name")?;
        let email = check_email(&request.email)?;
        check_password(&request.password)?;

        let mut guardian = Guardian::new(name, email);
        guardian.phone = request.phone;
        guardian.address = request.address;

        let hash = hash_password(&request.password)?;
        self.db
            .insert_guardian(&guardian, &hash)
            .map_err(|e| match CoreError::from(e) {
                CoreError::Conflict(_) => {
                    CoreError::Conflict(format!("Email already registered: {}", guardian.email))
                }
                other => other,
            })?;

        info!(guardian_id = %guardian.id, "guardian registered");
        Ok(guardian)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Check a password and open a session.
    pub fn login(&self, kind: AccountKind, request: &LoginRequest) -> CoreResult<LoginOutcome> {
        let email = normalize_email(&request.email);
        let credentials = match kind {
            AccountKind::Guardian => self.db.guardian_credentials(&email)?,
            AccountKind::Staff => self.db.staff_credentials(&email)?,
        };

        let credentials = credentials
            .filter(|c| verify_password(&request.password, &c.password_hash))
            .ok_or_else(|| {
                warn!(?kind, "login failed");
                CoreError::Unauthorized("Invalid email or password".into())
            })?;

        let expires_at = self
            .session_ttl
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| CoreError::BadRequest("Session lifetime out of range".into()))?
            .to_rfc3339();
        let token = uuid::Uuid::new_v4().to_string();
        self.db.insert_session(&Session {
            token_hash: hash_token(&token),
            account_id: credentials.account_id.clone(),
            role: credentials.role,
            expires_at: expires_at.clone(),
        })?;

        let actor = Actor::new(credentials.account_id, credentials.role);
        info!(account_id = %actor.account_id, role = actor.role.as_str(), "session opened");
        Ok(LoginOutcome {
            token,
            expires_at,
            role: actor.role,
            profile: self.profile(&actor)?,
        })
    }

    /// Resolve a bearer token to its caller.
    pub fn authenticate(&self, token: &str) -> CoreResult<Actor> {
        let token_hash = hash_token(token);
        let session = self
            .db
            .get_session(&token_hash)?
            .ok_or_else(|| CoreError::Unauthorized("Invalid or expired session".into()))?;

        let expired = DateTime::parse_from_rfc3339(&session.expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            self.db.delete_session(&token_hash)?;
            return Err(CoreError::Unauthorized("Invalid or expired session".into()));
        }

        if session.role.is_staff() {
            let active = self
                .db
                .get_staff(&session.account_id)?
                .map(|s| s.active)
                .unwrap_or(false);
            if !active {
                return Err(CoreError::Unauthorized("Account disabled".into()));
            }
        }

        Ok(Actor::new(session.account_id, session.role))
    }

    /// End a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> CoreResult<()> {
        self.db.delete_session(&hash_token(token))?;
        Ok(())
    }

    /// The account record behind an actor.
    pub fn profile(&self, actor: &Actor) -> CoreResult<Profile> {
        if actor.role == Role::Guardian {
            self.db
                .get_guardian(&actor.account_id)?
                .map(Profile::Guardian)
                .ok_or_else(|| CoreError::not_found("Guardian", &actor.account_id))
        } else {
            self.db
                .get_staff(&actor.account_id)?
                .map(Profile::Staff)
                .ok_or_else(|| CoreError::not_found("Staff", &actor.account_id))
        }
    }

    // =========================================================================
    // Staff
    // =========================================================================

    pub fn create_staff(&self, actor: &Actor, request: NewStaff) -> CoreResult<Staff> {
        authorize(actor, Resource::Staff, Action::Create)?;
        if !request.role.is_staff() {
            return Err(CoreError::BadRequest("Guardians register themselves".into()));
        }
        let name = required(&request.name, "name")?;
        let email = check_email(&request.email)?;
        check_password(&request.password)?;

        let mut staff = Staff::new(name, email, request.role);
        staff.phone = request.phone;
        staff.specialization = request.specialization;

        let hash = hash_password(&request.password)?;
        self.db.atomic(|db| db.insert_staff(&staff, &hash))
            .map_err(|e| match CoreError::from(e) {
                CoreError::Conflict(_) => {
                    CoreError::Conflict(format!("Email already registered: {}", staff.email))
                }
                other => other,
            })?;

        info!(staff_id = %staff.id, role = staff.role.as_str(), "staff created");
        Ok(staff)
    }

    pub fn update_staff(&self, actor: &Actor, id: &str, update: StaffUpdate) -> CoreResult<Staff> {
        authorize(actor, Resource::Staff, Action::Update)?;
        let mut staff = self
            .db
            .get_staff(id)?
            .ok_or_else(|| CoreError::not_found("Staff", id))?;

        if let Some(name) = update.name {
            staff.name = required(&name, "name")?;
        }
        if let Some(phone) = update.phone {
            staff.phone = Some(phone);
        }
        if let Some(specialization) = update.specialization {
            staff.specialization = Some(specialization);
        }
        if let Some(active) = update.active {
            if !active && actor.is(id) {
                return Err(CoreError::BadRequest("Cannot deactivate yourself".into()));
            }
            staff.active = active;
        }
        staff.updated_at = Utc::now().to_rfc3339();

        self.db.update_staff(&staff)?;
        if !staff.active {
            self.db.delete_sessions_for(&staff.id)?;
        }
        info!(staff_id = %staff.id, active = staff.active, "staff updated");
        Ok(staff)
    }

    pub fn list_staff(&self, actor: &Actor, role: Option<Role>) -> CoreResult<Vec<Staff>> {
        authorize(actor, Resource::Staff, Action::List)?;
        Ok(self.db.list_staff(role)?)
    }

    /// Remove a staff account. Caretakers still holding elders are a `Conflict`.
    pub fn delete_staff(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        authorize(actor, Resource::Staff, Action::Delete)?;
        if actor.is(id) {
            return Err(CoreError::BadRequest("Cannot delete yourself".into()));
        }
        let staff = self
            .db
            .get_staff(id)?
            .ok_or_else(|| CoreError::not_found("Staff", id))?;

        if let Some(caretaker) = self.db.get_caretaker(&staff.id)? {
            if !caretaker.assigned_elders.is_empty() {
                return Err(CoreError::Conflict(format!(
                    "Caretaker {} still has {} assigned elder(s)",
                    staff.id,
                    caretaker.assigned_elders.len()
                )));
            }
        }

        self.db.atomic(|db| -> CoreResult<()> {
            db.delete_sessions_for(&staff.id)?;
            db.delete_staff(&staff.id)?;
            Ok(())
        })?;
        info!(staff_id = %staff.id, "staff deleted");
        Ok(())
    }

    /// Make sure an active admin account exists for `email`. Returns the account.
    ///
    /// An existing account under that email must itself be an active admin,
    /// otherwise this is a `Conflict`.
    pub fn bootstrap_admin(&self, email: &str, password: &str) -> CoreResult<Staff> {
        let email = check_email(email)?;
        if let Some(existing) = self.db.find_staff_by_email(&email)? {
            if existing.role != Role::Admin || !existing.active {
                return Err(CoreError::Conflict(format!(
                    "{email} belongs to a {} account that is not an active admin",
                    existing.role.as_str()
                )));
            }
            return Ok(existing);
        }
        check_password(password)?;

        let staff = Staff::new("Administrator".into(), email, Role::Admin);
        self.db.insert_staff(&staff, &hash_password(password)?)?;
        info!(staff_id = %staff.id, "bootstrap admin created");
        Ok(staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{self, PASSWORD};

    fn login(db: &Database, kind: AccountKind, email: &str, password: &str) -> CoreResult<LoginOutcome> {
        AccountService::new(db).login(
            kind,
            &LoginRequest {
                email: email.into(),
                password: password.into(),
            },
        )
    }

    #[test]
    fn test_password_hash_is_salted_argon2() {
        let first = hash_password(PASSWORD).unwrap();
        let second = hash_password(PASSWORD).unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);

        assert!(verify_password(PASSWORD, &first));
        assert!(verify_password(PASSWORD, &second));
        assert!(!verify_password("wrong-horse", &first));
        assert!(!verify_password(PASSWORD, "not-a-phc-string"));
    }

    #[test]
    fn test_stored_hash_is_not_the_password() {
        let db = Database::open_in_memory().unwrap();
        testing::guardian(&db, "ann@example.com");
        let credentials = db.guardian_credentials("ann@example.com").unwrap().unwrap();
        assert!(credentials.password_hash.starts_with("$argon2id$"));
        assert!(!credentials.password_hash.contains(PASSWORD));
    }

    #[test]
    fn test_oversized_session_ttl_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        testing::admin(&db);

        for hours in [3_000_000_000, i64::MAX] {
            let err = AccountService::new(&db)
                .with_session_ttl(hours)
                .login(
                    AccountKind::Staff,
                    &LoginRequest {
                        email: "root@care.org".into(),
                        password: PASSWORD.into(),
                    },
                )
                .unwrap_err();
            assert!(matches!(err, CoreError::BadRequest(_)));
        }

        let outcome = AccountService::new(&db)
            .with_session_ttl(MAX_SESSION_HOURS)
            .login(
                AccountKind::Staff,
                &LoginRequest {
                    email: "root@care.org".into(),
                    password: PASSWORD.into(),
                },
            )
            .unwrap();
        assert!(AccountService::new(&db).authenticate(&outcome.token).is_ok());
    }

    #[test]
    fn test_register_duplicate_email_conflicts() {
        let db = Database::open_in_memory().unwrap();
        testing::guardian(&db, "ann@example.com");

        let err = AccountService::new(&db)
            .register_guardian(NewGuardian {
                name: "Other".into(),
                email: "ANN@example.com".into(),
                password: PASSWORD.into(),
                phone: None,
                address: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_login_authenticate_logout() {
        let db = Database::open_in_memory().unwrap();
        let guardian = testing::guardian(&db, "ann@example.com");

        let outcome = login(&db, AccountKind::Guardian, "Ann@Example.com", PASSWORD).unwrap();
        assert_eq!(outcome.role, Role::Guardian);

        let service = AccountService::new(&db);
        let actor = service.authenticate(&outcome.token).unwrap();
        assert_eq!(actor, guardian);

        // Raw token never stored
        let stored: String = db
            .conn()
            .query_row("SELECT token_hash FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, outcome.token);

        service.logout(&outcome.token).unwrap();
        assert!(matches!(
            service.authenticate(&outcome.token),
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_password_and_wrong_table() {
        let db = Database::open_in_memory().unwrap();
        testing::guardian(&db, "ann@example.com");

        assert!(matches!(
            login(&db, AccountKind::Guardian, "ann@example.com", "not-the-password"),
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            login(&db, AccountKind::Staff, "ann@example.com", PASSWORD),
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_session_rejected() {
        let db = Database::open_in_memory().unwrap();
        testing::guardian(&db, "ann@example.com");

        let service = AccountService::new(&db).with_session_ttl(-1);
        let outcome = service
            .login(
                AccountKind::Guardian,
                &LoginRequest {
                    email: "ann@example.com".into(),
                    password: PASSWORD.into(),
                },
            )
            .unwrap();
        assert!(service.authenticate(&outcome.token).is_err());
    }

    #[test]
    fn test_caretaker_creation_and_deletion() {
        let db = Database::open_in_memory().unwrap();
        let admin = testing::admin(&db);
        let caretaker = testing::staff(&db, "cara@care.org", Role::Caretaker);
        assert!(db.get_caretaker(&caretaker.account_id).unwrap().is_some());

        let service = AccountService::new(&db);
        service.delete_staff(&admin, &caretaker.account_id).unwrap();
        assert!(db.get_staff(&caretaker.account_id).unwrap().is_none());
        assert!(db.get_caretaker(&caretaker.account_id).unwrap().is_none());
    }

    #[test]
    fn test_caretaker_with_elders_cannot_be_deleted() {
        let db = Database::open_in_memory().unwrap();
        let admin = testing::admin(&db);
        let guardian = testing::guardian(&db, "ann@example.com");
        let caretaker = testing::staff(&db, "cara@care.org", Role::Caretaker);
        testing::cared_elder(&db, &guardian, &caretaker, "Jane");

        let err = AccountService::new(&db)
            .delete_staff(&admin, &caretaker.account_id)
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_deactivated_staff_loses_sessions() {
        let db = Database::open_in_memory().unwrap();
        let admin = testing::admin(&db);
        let doctor = testing::staff(&db, "doc@care.org", Role::Doctor);
        let outcome = login(&db, AccountKind::Staff, "doc@care.org", PASSWORD).unwrap();

        let service = AccountService::new(&db);
        service
            .update_staff(
                &admin,
                &doctor.account_id,
                StaffUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(service.authenticate(&outcome.token).is_err());
        assert!(login(&db, AccountKind::Staff, "doc@care.org", PASSWORD).is_err());
    }

    #[test]
    fn test_staff_admin_only() {
        let db = Database::open_in_memory().unwrap();
        testing::admin(&db);
        let operator = testing::staff(&db, "op@care.org", Role::Operator);

        let err = AccountService::new(&db)
            .list_staff(&operator, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn test_bootstrap_admin_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let service = AccountService::new(&db);
        let first = service.bootstrap_admin("root@care.org", PASSWORD).unwrap();
        let second = service.bootstrap_admin("ROOT@care.org", PASSWORD).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_bootstrap_admin_rejects_other_accounts() {
        let db = Database::open_in_memory().unwrap();
        let admin = testing::admin(&db);
        testing::staff(&db, "cara@care.org", Role::Caretaker);
        let service = AccountService::new(&db);

        assert!(matches!(
            service.bootstrap_admin("cara@care.org", PASSWORD),
            Err(CoreError::Conflict(_))
        ));

        let other = testing::staff(&db, "second@care.org", Role::Admin);
        service
            .update_staff(
                &admin,
                &other.account_id,
                StaffUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(matches!(
            service.bootstrap_admin("second@care.org", PASSWORD),
            Err(CoreError::Conflict(_))
        ));
    }
}

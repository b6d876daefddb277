//! Domain models for the eldercare system.

mod account;
mod care;
mod consultation;
mod donation;
mod elder;
mod lifecycle;
mod payment;
mod room;

pub use account::*;
pub use care::*;
pub use consultation::*;
pub use donation::*;
pub use elder::*;
pub use lifecycle::*;
pub use payment::*;
pub use room::*;

/// Current time as an RFC 3339 string.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

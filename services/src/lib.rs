//! Workflow layer: everything between the persistence entities in `db` and a
//! presentation surface.
//!
//! Each `*_service` module owns one workflow family and takes the database
//! connection (and, where it publishes live events, the [`util::live::LiveHub`])
//! as explicit arguments. The `proctor` module is the in-memory session state
//! machine plus its async runner; it touches the database only through
//! [`attempt_service`] once a session reaches an outcome.

pub mod analytics_service;
pub mod attempt_service;
pub mod connection_service;
pub mod error;
pub mod follow_service;
pub mod notification_service;
pub mod proctor;
pub mod question_service;
pub mod test_service;
pub mod user_service;

pub use error::ServiceError;

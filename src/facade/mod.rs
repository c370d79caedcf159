//! Facades to external collaborators
//!
//! Probes never talk to a database or mail system directly; they get one of
//! these traits injected through [`Collaborators`](crate::core::Collaborators).
//! This keeps the orchestration core testable with the mocks in [`mock`].

pub mod mail;
pub mod query;

#[cfg(test)]
pub mod mock;

pub use mail::{MailMessage, MailTransport, PickupDirTransport};
pub use query::{QueryExecutor, SqliteExecutor};

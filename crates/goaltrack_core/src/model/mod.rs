//! Domain model for goals, their containers, and logged work intervals.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Provide lightweight projections used when joining records for display.
//!
//! # Invariants
//! - Every record carries the `OwnerId` it is scoped to.
//! - Instants are Unix epoch milliseconds.

use uuid::Uuid;

pub mod goal;
pub mod time_log;

/// Identifier of the authenticated user that owns a record.
///
/// Supplied by the auth collaborator on every call; core never derives it.
pub type OwnerId = Uuid;

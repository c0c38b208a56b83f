//! Domain types and DTOs
//!
//! Pure marketplace rules live here: validation, status machines, matching
//! and commission. Nothing in this module touches the database.

pub mod admin;
pub mod leads;
pub mod matching;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod quotes;
pub mod rfqs;
pub mod users;

use thiserror::Error;

/// A status change the lifecycle table does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move {entity} from '{from}' to '{to}'")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

impl TransitionError {
    pub fn new(entity: &'static str, from: &'static str, to: &'static str) -> Self {
        Self { entity, from, to }
    }
}

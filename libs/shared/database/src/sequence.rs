use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use shared_models::ErrorKind;

use crate::store::{Filter, RecordStore, SortKey, StoreError};

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("could not assign {field} after {attempts} attempts under concurrent writers")]
    Exhausted { field: String, attempts: u32 },

    #[error("insert violates unique index {index}")]
    Duplicate { index: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SequenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SequenceError::Exhausted { .. } => ErrorKind::Unavailable,
            SequenceError::Duplicate { .. } => ErrorKind::Conflict,
            SequenceError::Store(e) => e.kind(),
        }
    }
}

/// A per-scope monotonic counter stored on the documents themselves, e.g.
/// `queue_number` within one hospital. `order_index` must name the unique
/// index over `(scope fields, order_field)`.
#[derive(Debug, Clone)]
pub struct SequenceScope<'a> {
    pub collection: &'a str,
    pub scope: Filter,
    pub order_field: &'a str,
    pub order_index: &'a str,
}

impl SequenceScope<'_> {
    /// Current maximum within the scope, or 0 for an empty scope.
    pub async fn current_max(&self, store: &dyn RecordStore) -> Result<u64, StoreError> {
        let last = store
            .find_first(self.collection, &self.scope, &[SortKey::desc(self.order_field)])
            .await?;
        Ok(last
            .as_ref()
            .and_then(|doc| doc.get(self.order_field))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

/// Inserts `document` with the scope's order field set to the next value.
/// The store assigns the number and inserts in one atomic step, so
/// concurrent writers in a scope never race for the same value. A collision
/// on the order index can still come from a row numbered outside this path;
/// that case is retried. Other unique violations are returned to the caller
/// as [`SequenceError::Duplicate`].
pub async fn insert_with_next_order(
    store: &dyn RecordStore,
    scope: &SequenceScope<'_>,
    max_attempts: u32,
    document: Value,
) -> Result<Value, SequenceError> {
    let attempts = max_attempts.max(1);

    for attempt in 1..=attempts {
        let result = store
            .create_with_next_order(scope.collection, &scope.scope, scope.order_field, document.clone())
            .await;

        match result {
            Ok(created) => return Ok(created),
            Err(e) if e.violates(scope.order_index) => {
                debug!(
                    "{} already taken in {} (attempt {}/{}), retrying",
                    scope.order_field, scope.collection, attempt, attempts
                );
            }
            Err(StoreError::DuplicateKey { index, .. }) => {
                return Err(SequenceError::Duplicate { index });
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(
        "Gave up assigning {} in {} after {} attempts",
        scope.order_field, scope.collection, attempts
    );
    Err(SequenceError::Exhausted {
        field: scope.order_field.to_string(),
        attempts,
    })
}

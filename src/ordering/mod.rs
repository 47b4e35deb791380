//! Gap-free positional ordering for subphases and their detail lines.
//!
//! After every completed mutation the `order_number` values of a phase's
//! subphases are exactly `1..=count`, and a subphase's details are numbered
//! `1..=len` in list order. Each operation runs in one store transaction and is
//! rolled back on any failure, so readers never observe a partial reorder.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod postgres;
pub mod store;

pub use postgres::PgOrderedStore;
pub use store::{OrderedStore, OrderedTx, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Subphase {
    pub id: i64,
    pub phase_id: i64,
    pub name: String,
    pub order_number: i32,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedDetail {
    pub detail: String,
    pub order_number: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubphase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Each field is applied only when present
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubphaseUpdate {
    pub name: Option<String>,
    pub details: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Position for a row appended after the current maximum (empty parent is 0)
pub fn next_order(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// Number a detail list 1..=len in the given order
pub fn numbered(details: &[String]) -> Vec<OrderedDetail> {
    details
        .iter()
        .zip(1..)
        .map(|(detail, order_number)| OrderedDetail {
            detail: detail.clone(),
            order_number,
        })
        .collect()
}

/// Transactional manager for a phase's ordered subphases
#[derive(Clone)]
pub struct OrderedCollection {
    store: Arc<dyn OrderedStore>,
}

impl OrderedCollection {
    pub fn new(store: Arc<dyn OrderedStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, phase_id: i64) -> Result<Vec<Subphase>, OrderError> {
        Ok(self.store.list(phase_id).await?)
    }

    /// Insert a subphase at `max(order_number) + 1` together with its details.
    ///
    /// No lock is held across the parent: two concurrent appends can read the
    /// same maximum and land on the same position, and an append racing a
    /// `remove_and_compact` can land one past the compacted range. Ordering is
    /// presentation order only, and the next `remove_and_compact` on the
    /// phase re-ranks the rows by `(order_number, id)`.
    ///
    /// Deletes do not share this race: `remove_and_compact` row-locks the
    /// whole sibling set first, so concurrent deletes in one phase serialize.
    pub async fn append(&self, phase_id: i64, new: NewSubphase) -> Result<i64, OrderError> {
        let name = validate_name(&new.name)?;

        let mut tx = self.store.begin().await?;
        let outcome = async {
            let order_number = next_order(tx.max_order(phase_id).await?);
            let id = tx.insert_subphase(phase_id, name, order_number).await?;
            tx.insert_details(id, &numbered(&new.details)).await?;
            Ok::<_, OrderError>(id)
        }
        .await;

        let id = finish(tx, outcome).await?;
        tracing::info!(phase_id, subphase_id = id, "Subphase appended");
        Ok(id)
    }

    /// Replace a subphase's whole detail list. Applying the same list twice
    /// leaves the same stored state.
    pub async fn replace_details(
        &self,
        phase_id: i64,
        id: i64,
        details: &[String],
    ) -> Result<(), OrderError> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            ensure_exists(tx.as_mut(), phase_id, id).await?;
            replace_in(tx.as_mut(), id, details).await
        }
        .await;

        finish(tx, outcome).await
    }

    /// Rename and/or replace details in one transaction
    pub async fn update(
        &self,
        phase_id: i64,
        id: i64,
        changes: SubphaseUpdate,
    ) -> Result<(), OrderError> {
        if changes.name.is_none() && changes.details.is_none() {
            return Err(OrderError::Validation {
                field: "name",
                message: "No fields provided for update.".to_string(),
            });
        }
        let name = changes.name.as_deref().map(validate_name).transpose()?;

        let mut tx = self.store.begin().await?;
        let outcome = async {
            ensure_exists(tx.as_mut(), phase_id, id).await?;
            if let Some(name) = name {
                tx.rename_subphase(id, name).await?;
            }
            if let Some(details) = changes.details.as_deref() {
                replace_in(tx.as_mut(), id, details).await?;
            }
            Ok::<_, OrderError>(())
        }
        .await;

        finish(tx, outcome).await?;
        tracing::info!(phase_id, subphase_id = id, "Subphase updated");
        Ok(())
    }

    /// Delete a subphase and its details, then close the gap by re-ranking the
    /// surviving siblings. Delete and compaction commit or roll back together.
    pub async fn remove_and_compact(&self, phase_id: i64, id: i64) -> Result<(), OrderError> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            tx.lock_siblings(phase_id).await?;
            ensure_exists(tx.as_mut(), phase_id, id).await?;
            tx.delete_details(id).await?;
            tx.delete_subphase(id).await?;
            tx.compact(phase_id).await?;
            Ok::<_, OrderError>(())
        }
        .await;

        finish(tx, outcome).await?;
        tracing::info!(phase_id, subphase_id = id, "Subphase removed and siblings compacted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<&str, OrderError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(OrderError::Validation {
            field: "name",
            message: "Subphase name is required.".to_string(),
        });
    }
    Ok(trimmed)
}

async fn ensure_exists(tx: &mut dyn OrderedTx, phase_id: i64, id: i64) -> Result<(), OrderError> {
    if tx.subphase_exists(phase_id, id).await? {
        Ok(())
    } else {
        Err(OrderError::NotFound("Subphase not found".to_string()))
    }
}

async fn replace_in(tx: &mut dyn OrderedTx, id: i64, details: &[String]) -> Result<(), OrderError> {
    tx.delete_details(id).await?;
    tx.insert_details(id, &numbered(details)).await?;
    Ok(())
}

/// Commit on success; on failure roll back and hand back the original error
async fn finish<T>(tx: Box<dyn OrderedTx>, outcome: Result<T, OrderError>) -> Result<T, OrderError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed after '{}': {}", err, rollback_err);
            }
            Err(err)
        }
    }
}

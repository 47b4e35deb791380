use async_trait::async_trait;
use thiserror::Error;

use super::{OrderedDetail, Subphase};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parent phase does not exist")]
    MissingParent,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("store failure: {0}")]
    Failure(String),
}

/// Entry point into the backing store for ordered subphase rows
#[async_trait]
pub trait OrderedStore: Send + Sync {
    /// Open a transaction. The returned handle owns its connection until
    /// `commit` or `rollback` consumes it.
    async fn begin(&self) -> Result<Box<dyn OrderedTx>, StoreError>;

    /// Children of a phase in presentation order, each with ordered details
    async fn list(&self, phase_id: i64) -> Result<Vec<Subphase>, StoreError>;
}

/// Primitive statements run inside one store transaction.
///
/// Nothing here is visible to other readers until `commit`.
#[async_trait]
pub trait OrderedTx: Send {
    async fn max_order(&mut self, phase_id: i64) -> Result<Option<i32>, StoreError>;

    async fn insert_subphase(
        &mut self,
        phase_id: i64,
        name: &str,
        order_number: i32,
    ) -> Result<i64, StoreError>;

    /// Row-lock every child of `phase_id` until the transaction ends, so a
    /// concurrent delete in the same phase waits and then compacts against the
    /// committed sibling set
    async fn lock_siblings(&mut self, phase_id: i64) -> Result<(), StoreError>;

    async fn subphase_exists(&mut self, phase_id: i64, id: i64) -> Result<bool, StoreError>;

    async fn rename_subphase(&mut self, id: i64, name: &str) -> Result<(), StoreError>;

    async fn delete_details(&mut self, subphase_id: i64) -> Result<(), StoreError>;

    async fn insert_details(
        &mut self,
        subphase_id: i64,
        details: &[OrderedDetail],
    ) -> Result<(), StoreError>;

    async fn delete_subphase(&mut self, id: i64) -> Result<(), StoreError>;

    /// Renumber every child of `phase_id` to 1..=count ranked by
    /// (order_number, id)
    async fn compact(&mut self, phase_id: i64) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

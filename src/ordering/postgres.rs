use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{OrderedStore, OrderedTx, StoreError};
use super::{OrderedDetail, Subphase};
use crate::error::{sqlstate, FOREIGN_KEY_VIOLATION};

/// Ordered subphase storage backed by the shared Postgres pool
#[derive(Clone)]
pub struct PgOrderedStore {
    pool: PgPool,
}

impl PgOrderedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgOrderedTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderedStore for PgOrderedStore {
    async fn begin(&self) -> Result<Box<dyn OrderedTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgOrderedTx { tx }))
    }

    async fn list(&self, phase_id: i64) -> Result<Vec<Subphase>, StoreError> {
        let rows = sqlx::query_as::<_, Subphase>(
            r#"
            SELECT s.id, s.phase_id, s.name, s.order_number,
                   COALESCE(
                       array_agg(sd.detail ORDER BY sd.order_number) FILTER (WHERE sd.id IS NOT NULL),
                       ARRAY[]::text[]
                   ) AS details
            FROM subphases s
            LEFT JOIN subphase_details sd ON sd.subphase_id = s.id
            WHERE s.phase_id = $1
            GROUP BY s.id
            ORDER BY s.order_number, s.id
            "#,
        )
        .bind(phase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl OrderedTx for PgOrderedTx {
    async fn max_order(&mut self, phase_id: i64) -> Result<Option<i32>, StoreError> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(order_number) FROM subphases WHERE phase_id = $1",
        )
        .bind(phase_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(max)
    }

    async fn insert_subphase(
        &mut self,
        phase_id: i64,
        name: &str,
        order_number: i32,
    ) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO subphases (phase_id, name, order_number) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(phase_id)
        .bind(name)
        .bind(order_number)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match sqlstate(&e).as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => StoreError::MissingParent,
            _ => StoreError::Sqlx(e),
        })
    }

    async fn lock_siblings(&mut self, phase_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            "SELECT id FROM subphases WHERE phase_id = $1 ORDER BY order_number, id FOR UPDATE",
        )
        .bind(phase_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn subphase_exists(&mut self, phase_id: i64, id: i64) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM subphases WHERE id = $1 AND phase_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(phase_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(found.is_some())
    }

    async fn rename_subphase(&mut self, id: i64, name: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE subphases SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_details(&mut self, subphase_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM subphase_details WHERE subphase_id = $1")
            .bind(subphase_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_details(
        &mut self,
        subphase_id: i64,
        details: &[OrderedDetail],
    ) -> Result<(), StoreError> {
        if details.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = details.iter().map(|d| d.detail.clone()).collect();
        let orders: Vec<i32> = details.iter().map(|d| d.order_number).collect();

        sqlx::query(
            r#"
            INSERT INTO subphase_details (subphase_id, detail, order_number)
            SELECT $1, t.detail, t.order_number
            FROM UNNEST($2::text[], $3::int4[]) AS t(detail, order_number)
            "#,
        )
        .bind(subphase_id)
        .bind(texts)
        .bind(orders)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_subphase(&mut self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM subphases WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn compact(&mut self, phase_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE subphases AS s
            SET order_number = ranked.new_order
            FROM (
                SELECT id, (ROW_NUMBER() OVER (ORDER BY order_number, id))::int4 AS new_order
                FROM subphases
                WHERE phase_id = $1
            ) AS ranked
            WHERE s.id = ranked.id AND s.order_number <> ranked.new_order
            "#,
        )
        .bind(phase_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::{DbPool, OrmConn},
    entity::inventory,
    error::{AppError, AppResult},
    models::InventoryRecord,
    repos::InventoryRepo,
};

/// Authoritative per-product stock counts with two atomic mutation
/// primitives and a point read. Both primitives use relative SQL updates so
/// concurrent calls never lose updates.
#[derive(Debug, Clone)]
pub struct InventoryService {
    inventory: InventoryRepo,
}

impl InventoryService {
    pub fn new() -> Self {
        Self {
            inventory: InventoryRepo,
        }
    }

    /// Admin restock. The delta must be strictly positive and the record
    /// must already exist.
    pub async fn add_stock(
        &self,
        orm: &OrmConn,
        pool: &DbPool,
        user_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> AppResult<InventoryRecord> {
        if delta <= 0 {
            return Err(AppError::InvalidRestock);
        }

        let affected = self.inventory.adjust(orm, product_id, delta).await?;
        if affected == 0 {
            return Err(AppError::InventoryNotFound);
        }

        if let Err(err) = log_audit(
            pool,
            Some(user_id),
            "restock",
            Some("inventory"),
            Some(serde_json::json!({ "product_id": product_id, "delta": delta })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        let record = self
            .inventory
            .find(orm, product_id)
            .await?
            .ok_or(AppError::InventoryNotFound)?;
        Ok(record_from_entity(record))
    }

    /// Single-unit purchase path, distinct from bulk checkout: the decrement
    /// is applied speculatively inside its own transaction and the result is
    /// re-read. A missing record or a negative quantity rolls the
    /// transaction back and fails as out-of-stock.
    pub async fn decrease_stock(
        &self,
        orm: &OrmConn,
        pool: &DbPool,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<InventoryRecord> {
        if quantity < 1 {
            return Err(AppError::BadRequest(
                "quantity must be at least 1".to_string(),
            ));
        }

        let txn = orm.begin().await?;

        let affected = self.inventory.adjust(&txn, product_id, -quantity).await?;
        if affected == 0 {
            return Err(AppError::OutOfStock);
        }

        // Read-after-write check; dropping the transaction undoes the
        // decrement when the balance went negative.
        let record = self.inventory.find(&txn, product_id).await?;
        let record = match record {
            Some(r) if r.quantity >= 0 => r,
            _ => return Err(AppError::OutOfStock),
        };

        txn.commit().await?;

        if let Err(err) = log_audit(
            pool,
            Some(user_id),
            "stock_decrease",
            Some("inventory"),
            Some(serde_json::json!({ "product_id": product_id, "quantity": quantity })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        Ok(record_from_entity(record))
    }

    pub async fn get_record(&self, orm: &OrmConn, product_id: Uuid) -> AppResult<InventoryRecord> {
        let record = self
            .inventory
            .find(orm, product_id)
            .await?
            .ok_or(AppError::InventoryNotFound)?;
        Ok(record_from_entity(record))
    }
}

impl Default for InventoryService {
    fn default() -> Self {
        Self::new()
    }
}

fn record_from_entity(model: inventory::Model) -> InventoryRecord {
    InventoryRecord {
        product_id: model.product_id,
        quantity: model.quantity,
        reserved: model.reserved,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

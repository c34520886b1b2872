use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect,
};
use uuid::Uuid;

use crate::entity::inventory::{self, Column as InvCol, Entity as Inventory};

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryRepo;

impl InventoryRepo {
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<Option<inventory::Model>, DbErr> {
        Inventory::find_by_id(product_id).one(conn).await
    }

    /// Load the inventory rows for the given products under `FOR UPDATE`.
    /// Concurrent checkouts contending on any of these products serialize
    /// here until the surrounding transaction commits or rolls back.
    pub async fn find_many_for_update(
        &self,
        txn: &DatabaseTransaction,
        product_ids: &[Uuid],
    ) -> Result<Vec<inventory::Model>, DbErr> {
        Inventory::find()
            .filter(InvCol::ProductId.is_in(product_ids.iter().copied()))
            .lock(LockType::Update)
            .all(txn)
            .await
    }

    /// Relative quantity update (`quantity = quantity + delta`), applied in
    /// SQL so concurrent adjustments never lose updates. Returns the number
    /// of affected rows; 0 means no record exists for the product.
    pub async fn adjust<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        delta: i32,
    ) -> Result<u64, DbErr> {
        let res = Inventory::update_many()
            .col_expr(InvCol::Quantity, Expr::col(InvCol::Quantity).add(delta))
            .col_expr(InvCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(InvCol::ProductId.eq(product_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }
}

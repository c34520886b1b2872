use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set,
};
use uuid::Uuid;

use crate::entity::{
    cart_items::{self, Column as LineCol, Entity as CartItems},
    carts::{self, Column as CartCol, Entity as Carts},
    products::{self, Column as ProdCol, Entity as Products},
};

/// One cart line joined with the product's current catalog price.
#[derive(Debug, Clone, FromQueryResult)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

/// One cart line compared against live inventory; `available` is `None` when
/// no inventory record exists for the product.
#[derive(Debug, Clone, FromQueryResult)]
pub struct LineAvailability {
    pub product_id: Uuid,
    pub requested: i32,
    pub available: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CartRepo;

impl CartRepo {
    /// Idempotent find-or-create of the user's single cart.
    pub async fn find_or_create<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<carts::Model, DbErr> {
        if let Some(cart) = Carts::find()
            .filter(CartCol::UserId.eq(user_id))
            .one(conn)
            .await?
        {
            return Ok(cart);
        }

        Carts::insert(carts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: NotSet,
        })
        .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

        // A concurrent request may have created the cart between the two
        // statements; the unique constraint makes the re-read authoritative.
        Carts::find()
            .filter(CartCol::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("cart".into()))
    }

    /// Load the cart's lines with current product prices, locking the line
    /// and product rows `FOR UPDATE` until the transaction ends.
    pub async fn lines_for_update(
        &self,
        txn: &DatabaseTransaction,
        cart_id: Uuid,
    ) -> Result<Vec<PricedLine>, DbErr> {
        CartItems::find()
            .select_only()
            .column_as(LineCol::ProductId, "product_id")
            .column_as(LineCol::Quantity, "quantity")
            .column_as(ProdCol::Price, "price")
            .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
            .filter(LineCol::CartId.eq(cart_id))
            .lock(LockType::Update)
            .into_model::<PricedLine>()
            .all(txn)
            .await
    }

    pub async fn find_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<cart_items::Model>, DbErr> {
        CartItems::find()
            .filter(LineCol::CartId.eq(cart_id))
            .filter(LineCol::ProductId.eq(product_id))
            .one(conn)
            .await
    }

    pub async fn insert_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<cart_items::Model, DbErr> {
        cart_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: NotSet,
        }
        .insert(conn)
        .await
    }

    pub async fn set_line_quantity<C: ConnectionTrait>(
        &self,
        conn: &C,
        line: cart_items::Model,
        quantity: i32,
    ) -> Result<cart_items::Model, DbErr> {
        let mut active: cart_items::ActiveModel = line.into();
        active.quantity = Set(quantity);
        active.update(conn).await
    }

    /// Returns the number of deleted rows (0 when no such line existed).
    pub async fn delete_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<u64, DbErr> {
        let res = CartItems::delete_many()
            .filter(LineCol::CartId.eq(cart_id))
            .filter(LineCol::ProductId.eq(product_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn clear<C: ConnectionTrait>(&self, conn: &C, cart_id: Uuid) -> Result<u64, DbErr> {
        let res = CartItems::delete_many()
            .filter(LineCol::CartId.eq(cart_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// Sum of line quantities; 0 for an empty cart.
    pub async fn item_count<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
    ) -> Result<i64, DbErr> {
        let total: Option<Option<i64>> = CartItems::find()
            .select_only()
            .column_as(LineCol::Quantity.sum(), "total")
            .filter(LineCol::CartId.eq(cart_id))
            .into_tuple()
            .one(conn)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    pub async fn lines_with_products<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<(cart_items::Model, Option<products::Model>)>, DbErr> {
        CartItems::find()
            .filter(LineCol::CartId.eq(cart_id))
            .order_by_desc(LineCol::CreatedAt)
            .limit(limit as u64)
            .offset(offset as u64)
            .find_also_related(Products)
            .all(conn)
            .await
    }

    pub async fn count_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
    ) -> Result<i64, DbErr> {
        let total = CartItems::find()
            .filter(LineCol::CartId.eq(cart_id))
            .count(conn)
            .await?;
        Ok(total as i64)
    }

    /// Dry-run availability read: every line left-joined with its inventory
    /// record, no locks taken.
    pub async fn lines_with_availability<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
    ) -> Result<Vec<LineAvailability>, DbErr> {
        use crate::entity::inventory::Column as InvCol;

        CartItems::find()
            .select_only()
            .column_as(LineCol::ProductId, "product_id")
            .column_as(LineCol::Quantity, "requested")
            .column_as(InvCol::Quantity, "available")
            .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
            .join(JoinType::LeftJoin, products::Relation::Inventory.def())
            .filter(LineCol::CartId.eq(cart_id))
            .into_model::<LineAvailability>()
            .all(conn)
            .await
    }
}

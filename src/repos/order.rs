use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::{
    order_items::{self, Column as LineCol, Entity as OrderItems},
    orders::{self, Column as OrderCol, Entity as Orders},
};
use crate::repos::cart::PricedLine;
use crate::routes::params::{OrderListQuery, SortOrder};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepo;

impl OrderRepo {
    /// Append a new order to the ledger; orders are never deleted.
    pub async fn insert_order(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        subtotal: i64,
        tax: i64,
        currency: &str,
    ) -> Result<orders::Model, DbErr> {
        orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            subtotal: Set(subtotal),
            tax: Set(tax),
            total: Set(subtotal + tax),
            currency: Set(currency.to_string()),
            status: Set("pending".into()),
            payment_status: Set("unpaid".into()),
            placed_at: Set(Utc::now().into()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(txn)
        .await
    }

    /// Bulk-create the order's lines from the checkout's priced cart lines,
    /// freezing each unit price at purchase time.
    pub async fn insert_lines(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<(), DbErr> {
        let models = lines.iter().map(|line| order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        });
        OrderItems::insert_many(models).exec(txn).await?;
        Ok(())
    }

    pub async fn find_for_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<orders::Model>, DbErr> {
        Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::UserId.eq(user_id))
                    .add(OrderCol::Id.eq(order_id)),
            )
            .one(conn)
            .await
    }

    pub async fn lines_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<order_items::Model>, DbErr> {
        OrderItems::find()
            .filter(LineCol::OrderId.eq(order_id))
            .all(conn)
            .await
    }

    pub async fn list_for_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        query: &OrderListQuery,
    ) -> Result<(Vec<orders::Model>, i64), DbErr> {
        let (_, limit, offset) = query.pagination.normalize();

        let mut condition = Condition::all().add(OrderCol::UserId.eq(user_id));
        if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
            condition = condition.add(OrderCol::Status.eq(status.clone()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
            SortOrder::Asc => finder.order_by_asc(OrderCol::PlacedAt),
            SortOrder::Desc => finder.order_by_desc(OrderCol::PlacedAt),
        };

        let total = finder.clone().count(conn).await? as i64;
        let orders = finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(conn)
            .await?;

        Ok((orders, total))
    }
}

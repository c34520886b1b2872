use std::collections::HashMap;

use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::{DbPool, OrmConn},
    dto::orders::{OrderList, OrderReceipt, OrderWithItems, ReceiptLine},
    entity::{order_items, orders, users},
    error::{AppError, AppResult},
    models::{Order, OrderLine, PublicUser},
    repos::{CartRepo, InventoryRepo, OrderRepo, UserRepo, cart::PricedLine},
    routes::params::OrderListQuery,
};

/// Converts a user's cart into a durable order inside one transaction,
/// holding `FOR UPDATE` locks on the cart lines and the touched inventory
/// rows so that concurrent checkouts can never decrement a product below
/// zero. All repositories are injected by constructor; the service holds no
/// connection and no global state.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    carts: CartRepo,
    inventory: InventoryRepo,
    orders: OrderRepo,
    users: UserRepo,
    currency: String,
}

impl CheckoutService {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            carts: CartRepo,
            inventory: InventoryRepo,
            orders: OrderRepo,
            users: UserRepo,
            currency: currency.into(),
        }
    }

    /// The atomic cart-to-order transition. Any failure between `begin` and
    /// `commit` drops the transaction and rolls everything back: no order,
    /// no inventory change, no cart change survives a failed checkout.
    pub async fn checkout(
        &self,
        orm: &OrmConn,
        pool: &DbPool,
        user_id: Uuid,
    ) -> AppResult<OrderReceipt> {
        let txn = orm.begin().await?;

        let cart = self.carts.find_or_create(&txn, user_id).await?;
        let lines = self.carts.lines_for_update(&txn, cart.id).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let mut product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let available: HashMap<Uuid, i32> = self
            .inventory
            .find_many_for_update(&txn, &product_ids)
            .await?
            .into_iter()
            .map(|record| (record.product_id, record.quantity))
            .collect();

        let subtotal = validate_and_total(&lines, &available)?;
        // Tax computation is deferred to a downstream collaborator.
        let tax = 0;

        let order = self
            .orders
            .insert_order(&txn, user_id, subtotal, tax, &self.currency)
            .await?;
        self.orders.insert_lines(&txn, order.id, &lines).await?;

        for line in &lines {
            self.inventory
                .adjust(&txn, line.product_id, -line.quantity)
                .await?;
        }

        self.carts.clear(&txn, cart.id).await?;

        txn.commit().await?;

        // Re-read the committed state for the receipt.
        let order = self
            .orders
            .find_for_user(orm, user_id, order.id)
            .await?
            .ok_or(AppError::NotFound)?;
        let items = self.orders.lines_for_order(orm, order.id).await?;
        let user = self
            .users
            .find(orm, user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Err(err) = log_audit(
            pool,
            Some(user_id),
            "checkout",
            Some("orders"),
            Some(serde_json::json!({ "order_id": order.id, "total": order.total })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        Ok(build_receipt(order, items, user))
    }

    pub async fn get_order(
        &self,
        orm: &OrmConn,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<OrderWithItems> {
        let order = self
            .orders
            .find_for_user(orm, user_id, order_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let items = self
            .orders
            .lines_for_order(orm, order.id)
            .await?
            .into_iter()
            .map(order_line_from_entity)
            .collect();

        Ok(OrderWithItems {
            order: order_from_entity(order),
            items,
        })
    }

    pub async fn list_orders(
        &self,
        orm: &OrmConn,
        user_id: Uuid,
        query: &OrderListQuery,
    ) -> AppResult<(OrderList, i64)> {
        let (orders, total) = self.orders.list_for_user(orm, user_id, query).await?;
        let items = orders.into_iter().map(order_from_entity).collect();
        Ok((OrderList { items }, total))
    }
}

/// Checks every line against locked inventory and sums the order subtotal
/// from current prices. Fails on the first shortfall, identifying the
/// offending product; a product without an inventory record is a distinct
/// failure.
fn validate_and_total(lines: &[PricedLine], available: &HashMap<Uuid, i32>) -> AppResult<i64> {
    let mut subtotal: i64 = 0;
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("cart has invalid quantity".into()));
        }
        let stock = available
            .get(&line.product_id)
            .copied()
            .ok_or(AppError::InventoryNotFound)?;
        if stock < line.quantity {
            return Err(AppError::InsufficientStock(line.product_id));
        }
        subtotal += line.price * i64::from(line.quantity);
    }
    Ok(subtotal)
}

fn build_receipt(
    order: orders::Model,
    items: Vec<order_items::Model>,
    user: users::Model,
) -> OrderReceipt {
    OrderReceipt {
        id: order.id,
        user_id: order.user_id,
        subtotal: order.subtotal,
        tax: order.tax,
        total: order.total,
        currency: order.currency,
        status: order.status,
        payment_status: order.payment_status,
        placed_at: order.placed_at.with_timezone(&Utc),
        items: items
            .into_iter()
            .map(|item| ReceiptLine {
                product_id: item.product_id,
                quantity: item.quantity,
                price_at_purchase: item.price,
            })
            .collect(),
        user: PublicUser {
            id: user.id,
            email: user.email,
            role: user.role,
        },
    }
}

fn order_from_entity(model: orders::Model) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        subtotal: model.subtotal,
        tax: model.tax,
        total: model.total,
        currency: model.currency,
        status: model.status,
        payment_status: model.payment_status,
        placed_at: model.placed_at.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_line_from_entity(model: order_items::Model) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: i32, price: i64) -> PricedLine {
        PricedLine {
            product_id,
            quantity,
            price,
        }
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![line(a, 2, 1000), line(b, 3, 250)];
        let available = HashMap::from([(a, 10), (b, 10)]);

        let subtotal = validate_and_total(&lines, &available).unwrap();
        assert_eq!(subtotal, 2 * 1000 + 3 * 250);
    }

    #[test]
    fn shortfall_names_the_offending_product() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![line(a, 1, 100), line(b, 5, 100)];
        let available = HashMap::from([(a, 1), (b, 2)]);

        match validate_and_total(&lines, &available) {
            Err(AppError::InsufficientStock(id)) => assert_eq!(id, b),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn exact_stock_passes() {
        let a = Uuid::new_v4();
        let lines = vec![line(a, 2, 100)];
        let available = HashMap::from([(a, 2)]);
        assert_eq!(validate_and_total(&lines, &available).unwrap(), 200);
    }

    #[test]
    fn missing_inventory_record_is_not_a_shortfall() {
        let a = Uuid::new_v4();
        let lines = vec![line(a, 1, 100)];
        let available = HashMap::new();

        assert!(matches!(
            validate_and_total(&lines, &available),
            Err(AppError::InventoryNotFound)
        ));
    }
}

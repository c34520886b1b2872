use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::{DbPool, OrmConn},
    dto::cart::{CartLineView, CartList, StockIssue, StockValidation},
    entity::cart_items,
    error::{AppError, AppResult},
    models::{Cart, CartLine, Product},
    repos::{CartRepo, ProductRepo},
    routes::params::Pagination,
};

/// CRUD over a user's cart lines, independent of checkout. A user has at
/// most one cart, created lazily on first access; at most one line exists
/// per (cart, product) pair.
#[derive(Debug, Clone)]
pub struct CartService {
    carts: CartRepo,
    products: ProductRepo,
}

impl CartService {
    pub fn new() -> Self {
        Self {
            carts: CartRepo,
            products: ProductRepo,
        }
    }

    pub async fn get_or_create_cart(&self, orm: &OrmConn, user_id: Uuid) -> AppResult<Cart> {
        let cart = self.carts.find_or_create(orm, user_id).await?;
        Ok(Cart {
            id: cart.id,
            user_id: cart.user_id,
            created_at: cart.created_at.with_timezone(&Utc),
        })
    }

    /// Adds a product to the cart. Adding an already-present product sums
    /// quantities into the existing line instead of duplicating it.
    pub async fn add_item(
        &self,
        orm: &OrmConn,
        pool: &DbPool,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartLine> {
        if quantity < 1 {
            return Err(AppError::BadRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
        if !self.products.exists(orm, product_id).await? {
            return Err(AppError::ProductNotFound);
        }

        let cart = self.carts.find_or_create(orm, user_id).await?;

        let line = match self.carts.find_line(orm, cart.id, product_id).await? {
            Some(existing) => {
                let merged = existing.quantity + quantity;
                self.carts.set_line_quantity(orm, existing, merged).await?
            }
            None => {
                self.carts
                    .insert_line(orm, cart.id, product_id, quantity)
                    .await?
            }
        };

        if let Err(err) = log_audit(
            pool,
            Some(user_id),
            "cart_update",
            Some("cart_items"),
            Some(serde_json::json!({ "product_id": product_id, "quantity": line.quantity })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        Ok(cart_line_from_entity(line))
    }

    /// Overwrites a line's quantity. A quantity below 1 deletes the line and
    /// is not an error; overwriting a line that does not exist is.
    pub async fn update_item_quantity(
        &self,
        orm: &OrmConn,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<Option<CartLine>> {
        let cart = self.carts.find_or_create(orm, user_id).await?;

        if quantity < 1 {
            self.carts.delete_line(orm, cart.id, product_id).await?;
            return Ok(None);
        }

        let line = self
            .carts
            .find_line(orm, cart.id, product_id)
            .await?
            .ok_or(AppError::ItemNotFound)?;
        let line = self.carts.set_line_quantity(orm, line, quantity).await?;

        Ok(Some(cart_line_from_entity(line)))
    }

    pub async fn remove_item(
        &self,
        orm: &OrmConn,
        pool: &DbPool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<()> {
        let cart = self.carts.find_or_create(orm, user_id).await?;
        let deleted = self.carts.delete_line(orm, cart.id, product_id).await?;
        if deleted == 0 {
            return Err(AppError::ItemNotFound);
        }

        if let Err(err) = log_audit(
            pool,
            Some(user_id),
            "cart_remove",
            Some("cart_items"),
            Some(serde_json::json!({ "product_id": product_id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        Ok(())
    }

    pub async fn clear_cart(&self, orm: &OrmConn, user_id: Uuid) -> AppResult<u64> {
        let cart = self.carts.find_or_create(orm, user_id).await?;
        Ok(self.carts.clear(orm, cart.id).await?)
    }

    pub async fn item_count(&self, orm: &OrmConn, user_id: Uuid) -> AppResult<i64> {
        let cart = self.carts.find_or_create(orm, user_id).await?;
        Ok(self.carts.item_count(orm, cart.id).await?)
    }

    pub async fn list_cart(
        &self,
        orm: &OrmConn,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<(CartList, i64)> {
        let (_, limit, offset) = pagination.normalize();
        let cart = self.carts.find_or_create(orm, user_id).await?;

        let total = self.carts.count_lines(orm, cart.id).await?;
        let rows = self
            .carts
            .lines_with_products(orm, cart.id, limit, offset)
            .await?;

        let items = rows
            .into_iter()
            .filter_map(|(line, product)| product.map(|p| cart_line_view(line, p)))
            .collect();

        Ok((
            CartList {
                cart_id: cart.id,
                items,
            },
            total,
        ))
    }

    /// Dry-run of the checkout stock validation: reports every line that
    /// would fail at live inventory levels without mutating or locking
    /// anything.
    pub async fn validate_stock(&self, orm: &OrmConn, user_id: Uuid) -> AppResult<StockValidation> {
        let cart = self.carts.find_or_create(orm, user_id).await?;
        let rows = self.carts.lines_with_availability(orm, cart.id).await?;

        let issues: Vec<StockIssue> = rows
            .into_iter()
            .filter(|row| row.available.unwrap_or(0) < row.requested)
            .map(|row| StockIssue {
                product_id: row.product_id,
                requested: row.requested,
                available: row.available.unwrap_or(0),
            })
            .collect();

        Ok(StockValidation {
            ok: issues.is_empty(),
            issues,
        })
    }
}

impl Default for CartService {
    fn default() -> Self {
        Self::new()
    }
}

fn cart_line_from_entity(model: cart_items::Model) -> CartLine {
    CartLine {
        id: model.id,
        cart_id: model.cart_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn cart_line_view(line: cart_items::Model, product: crate::entity::products::Model) -> CartLineView {
    CartLineView {
        id: line.id,
        quantity: line.quantity,
        product: Product {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            created_at: product.created_at.with_timezone(&Utc),
        },
    }
}

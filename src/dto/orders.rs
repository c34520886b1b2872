use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderLine, PublicUser};

/// The record a successful checkout returns: the created order, its lines
/// with prices frozen at purchase time, and the owner's public fields.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderReceipt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<ReceiptLine>,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiptLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_at_purchase: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

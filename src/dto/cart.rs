use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineView {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub cart_id: Uuid,
    pub items: Vec<CartLineView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemCount {
    pub count: i64,
}

/// One cart line that would fail checkout at current stock levels.
#[derive(Debug, Serialize, ToSchema)]
pub struct StockIssue {
    pub product_id: Uuid,
    pub requested: i32,
    pub available: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockValidation {
    pub ok: bool,
    pub issues: Vec<StockIssue>,
}

use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    /// Units to purchase; defaults to 1.
    pub quantity: Option<i32>,
}

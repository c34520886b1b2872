use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::inventory::{PurchaseRequest, RestockRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::InventoryRecord,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{product_id}", get(get_record))
        .route("/{product_id}/restock", post(restock))
        .route("/{product_id}/purchase", post(purchase))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Current stock record", body = ApiResponse<InventoryRecord>),
        (status = 404, description = "No inventory record for product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn get_record(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryRecord>>> {
    let record = state.inventory.get_record(&state.orm, product_id).await?;
    Ok(Json(ApiResponse::success("OK", record, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{product_id}/restock",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock increased (admin only)", body = ApiResponse<InventoryRecord>),
        (status = 400, description = "Non-positive restock quantity"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No inventory record for product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn restock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<Json<ApiResponse<InventoryRecord>>> {
    ensure_admin(&user)?;
    let record = state
        .inventory
        .add_stock(
            &state.orm,
            &state.pool,
            user.user_id,
            product_id,
            payload.quantity,
        )
        .await?;

    Ok(Json(ApiResponse::success(
        "Stock updated",
        record,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{product_id}/purchase",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Single-unit purchase decrement", body = ApiResponse<InventoryRecord>),
        (status = 400, description = "Out of stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<PurchaseRequest>,
) -> AppResult<Json<ApiResponse<InventoryRecord>>> {
    let quantity = payload.quantity.unwrap_or(1);
    let record = state
        .inventory
        .decrease_stock(&state.orm, &state.pool, user.user_id, product_id, quantity)
        .await?;

    Ok(Json(ApiResponse::success(
        "Stock decreased",
        record,
        Some(Meta::empty()),
    )))
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderReceipt, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List the current user's orders", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let (page, limit, _) = query.pagination.normalize();
    let (data, total) = state
        .checkout
        .list_orders(&state.orm, user.user_id, &query)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(Json(ApiResponse::success("Ok", data, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    responses(
        (status = 200, description = "Convert the cart into an order atomically", body = ApiResponse<OrderReceipt>),
        (status = 400, description = "Empty cart or insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderReceipt>>> {
    let receipt = state
        .checkout
        .checkout(&state.orm, &state.pool, user.user_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Checkout success",
        receipt,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Get one of the current user's orders with its lines", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let data = state.checkout.get_order(&state.orm, user.user_id, id).await?;
    Ok(Json(ApiResponse::success("OK", data, Some(Meta::empty()))))
}

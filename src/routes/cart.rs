use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddItemRequest, CartList, ItemCount, StockValidation, UpdateItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartLine,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_item).delete(clear_cart))
        .route("/count", get(item_count))
        .route("/validate", get(validate_stock))
        .route("/{product_id}", delete(remove_item).patch(update_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List cart lines for current user", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let (page, limit, _) = pagination.normalize();
    let (data, total) = state
        .cart
        .list_cart(&state.orm, user.user_id, &pagination)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(Json(ApiResponse::success("OK", data, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Add a product, merging into an existing line", body = ApiResponse<CartLine>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartLine>>> {
    let line = state
        .cart
        .add_item(
            &state.orm,
            &state.pool,
            user.user_id,
            payload.product_id,
            payload.quantity,
        )
        .await?;
    Ok(Json(ApiResponse::success("OK", line, None)))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Overwrite a line's quantity; below 1 removes the line", body = ApiResponse<Option<CartLine>>),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> AppResult<Json<ApiResponse<Option<CartLine>>>> {
    let line = state
        .cart
        .update_item_quantity(&state.orm, user.user_id, product_id, payload.quantity)
        .await?;

    let message = if line.is_some() {
        "Quantity updated"
    } else {
        "Removed from cart"
    };
    Ok(Json(ApiResponse::success(message, line, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .cart
        .remove_item(&state.orm, &state.pool, user.user_id, product_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Remove every line from the cart", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let removed = state.cart.clear_cart(&state.orm, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/cart/count",
    responses(
        (status = 200, description = "Sum of line quantities", body = ApiResponse<ItemCount>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn item_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ItemCount>>> {
    let count = state.cart.item_count(&state.orm, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "OK",
        ItemCount { count },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/cart/validate",
    responses(
        (status = 200, description = "Dry-run stock validation for every cart line", body = ApiResponse<StockValidation>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn validate_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StockValidation>>> {
    let report = state.cart.validate_stock(&state.orm, user.user_id).await?;
    Ok(Json(ApiResponse::success("OK", report, Some(Meta::empty()))))
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    entity::{Products, products},
    error::{AppError, AppResult},
    models::Product,
    repos::ProductRepo,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name filter"),
        ("min_price" = Option<i64>, Query, description = "Minimum price"),
        ("max_price" = Option<i64>, Query, description = "Maximum price")
    ),
    responses(
        (status = 200, description = "List catalog products", body = ApiResponse<ProductList>),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let (page, limit, _) = query.pagination.normalize();
    let (models, total) = ProductRepo.list(&state.orm, &query).await?;

    let items = models.into_iter().map(product_from_entity).collect();
    let meta = Meta::new(page, limit, total);
    Ok(Json(ApiResponse::success(
        "OK",
        ProductList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get one product", body = ApiResponse<Product>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound)?;

    Ok(Json(ApiResponse::success(
        "OK",
        product_from_entity(product),
        Some(Meta::empty()),
    )))
}

fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

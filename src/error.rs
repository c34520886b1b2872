use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(Uuid),

    #[error("Out of stock")]
    OutOfStock,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Inventory record not found")]
    InventoryNotFound,

    #[error("Cart item not found")]
    ItemNotFound,

    #[error("Invalid restock quantity")]
    InvalidRestock,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound
            | AppError::ProductNotFound
            | AppError::InventoryNotFound
            | AppError::ItemNotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::EmptyCart
            | AppError::InsufficientStock(_)
            | AppError::OutOfStock
            | AppError::InvalidRestock => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

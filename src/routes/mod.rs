use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod doc;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/inventory", inventory::router())
}

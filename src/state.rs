use crate::db::{DbPool, OrmConn};
use crate::services::{CartService, CheckoutService, InventoryService};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub checkout: CheckoutService,
    pub cart: CartService,
    pub inventory: InventoryService,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, currency: impl Into<String>) -> Self {
        Self {
            pool,
            orm,
            checkout: CheckoutService::new(currency),
            cart: CartService::new(),
            inventory: InventoryService::new(),
        }
    }
}

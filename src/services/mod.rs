pub mod cart_service;
pub mod inventory_service;
pub mod order_service;

pub use cart_service::CartService;
pub use inventory_service::InventoryService;
pub use order_service::CheckoutService;

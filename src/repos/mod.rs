//! Typed per-entity repositories. Plain reads are generic over any
//! [`sea_orm::ConnectionTrait`]; reads that must hold a row lock for the
//! duration of a transaction take a [`sea_orm::DatabaseTransaction`] and are
//! suffixed `_for_update`, so the locking contract is visible at the call
//! site. Repositories carry no connection of their own; the caller decides
//! the transaction scope.

pub mod cart;
pub mod inventory;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartRepo;
pub use inventory::InventoryRepo;
pub use order::OrderRepo;
pub use product::ProductRepo;
pub use user::UserRepo;

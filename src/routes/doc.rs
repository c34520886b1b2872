use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddItemRequest, CartLineView, CartList, ItemCount, StockIssue, StockValidation, UpdateItemRequest},
        inventory::{PurchaseRequest, RestockRequest},
        orders::{OrderList, OrderReceipt, OrderWithItems, ReceiptLine},
        products::ProductList,
    },
    models::{Cart, CartLine, InventoryRecord, Order, OrderLine, Product, PublicUser},
    response::{ApiResponse, Meta},
    routes::{cart, health, inventory, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::cart_list,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        cart::item_count,
        cart::validate_stock,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        inventory::get_record,
        inventory::restock,
        inventory::purchase,
        products::list_products,
        products::get_product
    ),
    components(
        schemas(
            PublicUser,
            Product,
            Cart,
            CartLine,
            InventoryRecord,
            Order,
            OrderLine,
            AddItemRequest,
            UpdateItemRequest,
            CartLineView,
            CartList,
            ItemCount,
            StockIssue,
            StockValidation,
            RestockRequest,
            PurchaseRequest,
            OrderReceipt,
            ReceiptLine,
            OrderWithItems,
            OrderList,
            ProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderReceipt>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<InventoryRecord>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Read-only catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Inventory", description = "Stock ledger endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        inventory::ActiveModel as InventoryActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    state::AppState,
};
use uuid::Uuid;

// Integration tests run against a real Postgres; they are skipped when no
// database is configured in the environment. Each test works on its own
// freshly created users and products, so tests stay independent without
// truncating shared tables.

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState::new(pool, orm, "USD")))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn create_product(state: &AppState, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Widget {}", Uuid::new_v4())),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    InventoryActive {
        product_id: Set(product.id),
        quantity: Set(stock),
        reserved: Set(0),
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn set_price(state: &AppState, product_id: Uuid, price: i64) -> anyhow::Result<()> {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use storefront_api::entity::products::{Column, Entity as Products};

    let product = Products::find()
        .filter(Column::Id.eq(product_id))
        .one(&state.orm)
        .await?
        .expect("product exists");
    let mut active: ProductActive = product.into();
    active.price = Set(price);
    active.update(&state.orm).await?;
    Ok(())
}

#[tokio::test]
async fn checkout_merges_lines_snapshots_price_and_clears_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let product_id = create_product(&state, 1000, 10).await?;

    // Adding the same product twice merges into one line with summed quantity.
    state
        .cart
        .add_item(&state.orm, &state.pool, user_id, product_id, 2)
        .await?;
    state
        .cart
        .add_item(&state.orm, &state.pool, user_id, product_id, 3)
        .await?;

    let (cart, total_lines) = state
        .cart
        .list_cart(
            &state.orm,
            user_id,
            &storefront_api::routes::params::Pagination {
                page: Some(1),
                per_page: Some(20),
            },
        )
        .await?;
    assert_eq!(total_lines, 1, "expected a single merged line");
    assert_eq!(cart.items[0].quantity, 5);

    // Price changes between cart-add and checkout must be reflected in the
    // order line: the unit price is read at checkout time.
    set_price(&state, product_id, 1200).await?;

    let receipt = state
        .checkout
        .checkout(&state.orm, &state.pool, user_id)
        .await?;

    assert_eq!(receipt.user_id, user_id);
    assert_eq!(receipt.status, "pending");
    assert_eq!(receipt.payment_status, "unpaid");
    assert_eq!(receipt.currency, "USD");
    assert_eq!(receipt.tax, 0);
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].price_at_purchase, 1200);
    assert_eq!(receipt.items[0].quantity, 5);
    assert_eq!(receipt.subtotal, 5 * 1200);
    assert_eq!(receipt.total, receipt.subtotal + receipt.tax);
    assert_eq!(receipt.user.role, "user");

    // The cart is emptied and the stock decremented by the same commit.
    assert_eq!(state.cart.item_count(&state.orm, user_id).await?, 0);
    let record = state.inventory.get_record(&state.orm, product_id).await?;
    assert_eq!(record.quantity, 5);

    // The committed order is readable afterwards.
    let fetched = state
        .checkout
        .get_order(&state.orm, user_id, receipt.id)
        .await?;
    assert_eq!(fetched.order.total, receipt.total);
    assert_eq!(fetched.items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn failed_checkout_leaves_cart_and_inventory_untouched() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let product_id = create_product(&state, 500, 2).await?;

    state
        .cart
        .add_item(&state.orm, &state.pool, user_id, product_id, 5)
        .await?;

    let err = state
        .checkout
        .checkout(&state.orm, &state.pool, user_id)
        .await
        .expect_err("checkout must fail on insufficient stock");
    match err {
        AppError::InsufficientStock(id) => assert_eq!(id, product_id),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing changed: the line still holds quantity 5, stock is still 2,
    // and no order was recorded for the user.
    assert_eq!(state.cart.item_count(&state.orm, user_id).await?, 5);
    let record = state.inventory.get_record(&state.orm, product_id).await?;
    assert_eq!(record.quantity, 2);

    let (orders, total) = state
        .checkout
        .list_orders(
            &state.orm,
            user_id,
            &storefront_api::routes::params::OrderListQuery {
                pagination: storefront_api::routes::params::Pagination {
                    page: None,
                    per_page: None,
                },
                status: None,
                sort_order: None,
            },
        )
        .await?;
    assert_eq!(total, 0);
    assert!(orders.items.is_empty());

    Ok(())
}

#[tokio::test]
async fn empty_cart_checkout_fails() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let err = state
        .checkout
        .checkout(&state.orm, &state.pool, user_id)
        .await
        .expect_err("empty cart must fail");
    assert!(matches!(err, AppError::EmptyCart));

    Ok(())
}

#[tokio::test]
async fn concurrent_checkouts_never_oversell() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    // Stock 3; two users each want 2. Only one checkout can succeed and the
    // committed quantity must never go negative.
    let product_id = create_product(&state, 100, 3).await?;
    let first = create_user(&state, "user").await?;
    let second = create_user(&state, "user").await?;

    for user_id in [first, second] {
        state
            .cart
            .add_item(&state.orm, &state.pool, user_id, product_id, 2)
            .await?;
    }

    let state_a = state.clone();
    let state_b = state.clone();
    let (res_a, res_b) = tokio::join!(
        async move {
            state_a
                .checkout
                .checkout(&state_a.orm, &state_a.pool, first)
                .await
        },
        async move {
            state_b
                .checkout
                .checkout(&state_b.orm, &state_b.pool, second)
                .await
        },
    );

    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the contending checkouts wins");

    for res in [res_a, res_b] {
        if let Err(err) = res {
            assert!(
                matches!(err, AppError::InsufficientStock(id) if id == product_id),
                "loser must fail with InsufficientStock, got {err:?}"
            );
        }
    }

    let record = state.inventory.get_record(&state.orm, product_id).await?;
    assert_eq!(record.quantity, 1);

    Ok(())
}

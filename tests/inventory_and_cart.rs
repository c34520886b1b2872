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
        description: Set(None),
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

#[tokio::test]
async fn restock_rejects_non_positive_delta() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin_id = create_user(&state, "admin").await?;
    let product_id = create_product(&state, 100, 7).await?;

    for delta in [0, -5] {
        let err = state
            .inventory
            .add_stock(&state.orm, &state.pool, admin_id, product_id, delta)
            .await
            .expect_err("non-positive delta must be rejected");
        assert!(matches!(err, AppError::InvalidRestock));
    }

    let record = state.inventory.get_record(&state.orm, product_id).await?;
    assert_eq!(record.quantity, 7, "rejected restocks must not mutate");

    let record = state
        .inventory
        .add_stock(&state.orm, &state.pool, admin_id, product_id, 3)
        .await?;
    assert_eq!(record.quantity, 10);

    Ok(())
}

#[tokio::test]
async fn restock_unknown_product_is_not_found() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin_id = create_user(&state, "admin").await?;
    let err = state
        .inventory
        .add_stock(&state.orm, &state.pool, admin_id, Uuid::new_v4(), 5)
        .await
        .expect_err("restocking a product without a record must fail");
    assert!(matches!(err, AppError::InventoryNotFound));

    Ok(())
}

#[tokio::test]
async fn decrease_stock_rolls_back_on_shortfall() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let product_id = create_product(&state, 100, 1).await?;

    let record = state
        .inventory
        .decrease_stock(&state.orm, &state.pool, user_id, product_id, 1)
        .await?;
    assert_eq!(record.quantity, 0);

    // The speculative decrement would land at -1; the transaction rolls
    // back and the committed quantity stays 0.
    let err = state
        .inventory
        .decrease_stock(&state.orm, &state.pool, user_id, product_id, 1)
        .await
        .expect_err("decrement below zero must fail");
    assert!(matches!(err, AppError::OutOfStock));

    let record = state.inventory.get_record(&state.orm, product_id).await?;
    assert_eq!(record.quantity, 0);

    // Missing record fails the same way on this path.
    let err = state
        .inventory
        .decrease_stock(&state.orm, &state.pool, user_id, Uuid::new_v4(), 1)
        .await
        .expect_err("missing record must fail");
    assert!(matches!(err, AppError::OutOfStock));

    Ok(())
}

#[tokio::test]
async fn update_quantity_overwrites_and_below_one_removes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let product_id = create_product(&state, 100, 10).await?;

    state
        .cart
        .add_item(&state.orm, &state.pool, user_id, product_id, 2)
        .await?;

    let line = state
        .cart
        .update_item_quantity(&state.orm, user_id, product_id, 7)
        .await?
        .expect("line still present");
    assert_eq!(line.quantity, 7, "update overwrites, it does not merge");

    let removed = state
        .cart
        .update_item_quantity(&state.orm, user_id, product_id, 0)
        .await?;
    assert!(removed.is_none());
    assert_eq!(state.cart.item_count(&state.orm, user_id).await?, 0);

    // Updating a line that does not exist is an error.
    let err = state
        .cart
        .update_item_quantity(&state.orm, user_id, product_id, 3)
        .await
        .expect_err("no such line");
    assert!(matches!(err, AppError::ItemNotFound));

    Ok(())
}

#[tokio::test]
async fn add_item_requires_existing_product_and_positive_quantity() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let product_id = create_product(&state, 100, 10).await?;

    let err = state
        .cart
        .add_item(&state.orm, &state.pool, user_id, Uuid::new_v4(), 1)
        .await
        .expect_err("unknown product");
    assert!(matches!(err, AppError::ProductNotFound));

    let err = state
        .cart
        .add_item(&state.orm, &state.pool, user_id, product_id, 0)
        .await
        .expect_err("non-positive quantity");
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn validate_stock_reports_shortfalls_without_mutating() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user").await?;
    let scarce = create_product(&state, 100, 1).await?;
    let plentiful = create_product(&state, 100, 50).await?;

    state
        .cart
        .add_item(&state.orm, &state.pool, user_id, scarce, 4)
        .await?;
    state
        .cart
        .add_item(&state.orm, &state.pool, user_id, plentiful, 4)
        .await?;

    let report = state.cart.validate_stock(&state.orm, user_id).await?;
    assert!(!report.ok);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].product_id, scarce);
    assert_eq!(report.issues[0].requested, 4);
    assert_eq!(report.issues[0].available, 1);

    // The dry run changed nothing.
    assert_eq!(state.cart.item_count(&state.orm, user_id).await?, 8);
    let record = state.inventory.get_record(&state.orm, scarce).await?;
    assert_eq!(record.quantity, 1);

    Ok(())
}

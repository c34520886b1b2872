use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user123", "user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550000i64, 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120000, 100),
        ("Rust Sticker Pack", "Decorate your laptop", 50000, 200),
        ("E-book: Async Rust", "Learn async Rust patterns", 250000, 75),
    ];

    for (name, desc, price, stock) in products {
        let id = Uuid::new_v4();
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .fetch_optional(pool)
        .await?;

        // Seed an inventory record alongside each new product.
        if let Some((product_id,)) = row {
            sqlx::query(
                r#"
                INSERT INTO inventory (product_id, quantity)
                VALUES ($1, $2)
                ON CONFLICT (product_id) DO NOTHING
                "#,
            )
            .bind(product_id)
            .bind(stock)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded products and inventory");
    Ok(())
}

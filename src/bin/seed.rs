use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use carshop_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let seller_id = ensure_user(&pool, "seller", "seller@example.com", "seller123").await?;
    let buyer_id = ensure_user(&pool, "buyer", "buyer@example.com", "buyer123").await?;
    seed_cars(&pool, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}, Buyer ID: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} <{email}>");
    Ok(user_id)
}

async fn seed_cars(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let cars = vec![
        ("BMW", "X5", 2019, 3_450_000_i64, "Well maintained, single owner"),
        ("Toyota", "Corolla", 2021, 1_890_000, "Low mileage, full service history"),
        ("Volkswagen", "Golf", 2017, 1_250_000, "Fresh inspection, new tires"),
        ("Tesla", "Model 3", 2022, 3_990_000, "Long range, autopilot included"),
    ];

    for (brand, model, year, price, desc) in cars {
        sqlx::query(
            r#"
            INSERT INTO cars (id, brand, model, year, price, description, available, seller_id)
            SELECT $1, $2, $3, $4, $5, $6, TRUE, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM cars WHERE brand = $2 AND model = $3 AND seller_id = $7
            )
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(brand)
        .bind(model)
        .bind(year)
        .bind(price)
        .bind(desc)
        .bind(seller_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded cars");
    Ok(())
}

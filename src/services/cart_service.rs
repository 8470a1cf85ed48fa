use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::DbPool,
    dto::cart::{CartEntry, CartView},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Car, CartItem},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartWithCarRow {
    cart_id: Uuid,
    added_at: DateTime<Utc>,
    car_id: Uuid,
    brand: String,
    model: String,
    year: i32,
    price: i64,
    description: Option<String>,
    image_url: Option<String>,
    available: bool,
    seller_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = sqlx::query_as::<_, CartWithCarRow>(
        r#"
        SELECT ci.id AS cart_id, ci.created_at AS added_at,
               c.id AS car_id, c.brand, c.model, c.year, c.price, c.description,
               c.image_url, c.available, c.seller_id, c.created_at, c.updated_at
        FROM cart_items ci
        JOIN cars c ON c.id = ci.car_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let total_price: i64 = rows.iter().map(|row| row.price).sum();

    let items = rows
        .into_iter()
        .map(|row| CartEntry {
            id: row.cart_id,
            created_at: row.added_at,
            car: Car {
                id: row.car_id,
                brand: row.brand,
                model: row.model,
                year: row.year,
                price: row.price,
                description: row.description,
                image_url: row.image_url,
                available: row.available,
                seller_id: row.seller_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartView { items, total_price },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    car_id: Uuid,
) -> AppResult<ApiResponse<CartItem>> {
    let car: Option<(bool, String, String)> =
        sqlx::query_as("SELECT available, brand, model FROM cars WHERE id = $1")
            .bind(car_id)
            .fetch_optional(pool)
            .await?;

    let (available, brand, model) = match car {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    if !available {
        return Err(AppError::Rule(
            "This car is no longer available for purchase".into(),
        ));
    }

    let existing: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND car_id = $2")
            .bind(user.user_id)
            .bind(car_id)
            .fetch_optional(pool)
            .await?;

    // Already present is informational, not an error.
    if let Some(item) = existing {
        return Ok(ApiResponse::success(
            "This car is already in your cart",
            item,
            Some(Meta::empty()),
        ));
    }

    let item: CartItem = sqlx::query_as(
        "INSERT INTO cart_items (id, user_id, car_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(car_id)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        AuditAction::CartAdd,
        Some(serde_json::json!({ "car_id": car_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("{} {} added to cart", brand, model),
        item,
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    car_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE car_id = $1 AND user_id = $2")
        .bind(car_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        AuditAction::CartRemove,
        Some(serde_json::json!({ "car_id": car_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

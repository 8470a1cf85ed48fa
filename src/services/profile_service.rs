use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::DbPool,
    dto::profiles::{MyProfile, ProfileMetrics, SellerProfile, UpdateProfileRequest},
    dto::reviews::ReviewWithBuyer,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Car, PublicUser, Review, User},
    response::{ApiResponse, Meta},
    services::review_service,
    state::AppState,
};

/// Profiles are a lazily created anchor row; all interesting numbers are
/// recomputed from reviews and orders on every read.
pub async fn ensure_profile(pool: &DbPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO user_profiles (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// (average rating rounded to one decimal, review count) for a seller.
pub async fn seller_rating(pool: &DbPool, seller_id: Uuid) -> AppResult<(Option<f64>, i64)> {
    let row: (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating)::double precision, COUNT(*) FROM reviews WHERE seller_id = $1",
    )
    .bind(seller_id)
    .fetch_one(pool)
    .await?;

    let average = row.0.map(|avg| (avg * 10.0).round() / 10.0);
    Ok((average, row.1))
}

pub async fn metrics(pool: &DbPool, seller_id: Uuid) -> AppResult<ProfileMetrics> {
    let (average_rating, reviews_count) = seller_rating(pool, seller_id).await?;

    let sales: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM orders o
        JOIN cars c ON c.id = o.car_id
        WHERE c.seller_id = $1 AND o.status = 'completed'
        "#,
    )
    .bind(seller_id)
    .fetch_one(pool)
    .await?;

    Ok(ProfileMetrics {
        average_rating,
        reviews_count,
        sales_count: sales.0,
    })
}

#[derive(FromRow)]
struct ReviewBuyerRow {
    id: Uuid,
    seller_id: Uuid,
    buyer_id: Uuid,
    order_id: Uuid,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    buyer_username: String,
}

pub async fn seller_reviews(pool: &DbPool, seller_id: Uuid) -> AppResult<Vec<ReviewWithBuyer>> {
    let rows = sqlx::query_as::<_, ReviewBuyerRow>(
        r#"
        SELECT r.id, r.seller_id, r.buyer_id, r.order_id, r.rating, r.comment,
               r.created_at, r.updated_at, u.username AS buyer_username
        FROM reviews r
        JOIN users u ON u.id = r.buyer_id
        WHERE r.seller_id = $1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ReviewWithBuyer {
            buyer: PublicUser {
                id: row.buyer_id,
                username: row.buyer_username,
            },
            review: Review {
                id: row.id,
                seller_id: row.seller_id,
                buyer_id: row.buyer_id,
                order_id: row.order_id,
                rating: row.rating,
                comment: row.comment,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
        .collect())
}

pub async fn seller_profile(
    state: &AppState,
    seller_id: Uuid,
    viewer: Option<&AuthUser>,
) -> AppResult<ApiResponse<SellerProfile>> {
    let seller: Option<PublicUser> =
        sqlx::query_as("SELECT id, username FROM users WHERE id = $1")
            .bind(seller_id)
            .fetch_optional(&state.pool)
            .await?;
    let seller = seller.ok_or(AppError::NotFound)?;

    ensure_profile(&state.pool, seller_id).await?;

    let metrics = metrics(&state.pool, seller_id).await?;
    let reviews = seller_reviews(&state.pool, seller_id).await?;

    let cars_for_sale = sqlx::query_as::<_, Car>(
        "SELECT * FROM cars WHERE seller_id = $1 AND available ORDER BY created_at DESC",
    )
    .bind(seller_id)
    .fetch_all(&state.pool)
    .await?;

    let reviewable_orders = match viewer {
        Some(viewer) if viewer.user_id != seller_id => {
            review_service::reviewable_orders(state, viewer, seller_id).await?
        }
        _ => Vec::new(),
    };

    Ok(ApiResponse::success(
        "Seller profile",
        SellerProfile {
            seller,
            metrics,
            cars_for_sale,
            reviews,
            reviewable_orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn my_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MyProfile>> {
    let account: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    ensure_profile(&state.pool, account.id).await?;

    let metrics = metrics(&state.pool, account.id).await?;
    let reviews = seller_reviews(&state.pool, account.id).await?;

    Ok(ApiResponse::success(
        "Profile",
        MyProfile {
            id: account.id,
            username: account.username,
            email: account.email,
            metrics,
            reviews,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<MyProfile>> {
    let account: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let username = payload.username.unwrap_or(account.username);
    let email = payload.email.unwrap_or(account.email);

    if username.trim().is_empty() {
        return Err(AppError::BadRequest("Username must not be empty".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }

    let taken: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM users WHERE (username = $1 OR email = $2) AND id <> $3",
    )
    .bind(username.as_str())
    .bind(email.as_str())
    .bind(account.id)
    .fetch_optional(&state.pool)
    .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest(
            "Username or email is already taken".into(),
        ));
    }

    sqlx::query("UPDATE users SET username = $2, email = $3 WHERE id = $1")
        .bind(account.id)
        .bind(username.as_str())
        .bind(email.as_str())
        .execute(&state.pool)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(account.id),
        AuditAction::ProfileUpdate,
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let mut resp = my_profile(state, user).await?;
    resp.message = "Profile updated".into();
    Ok(resp)
}

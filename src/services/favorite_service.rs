use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::DbPool,
    dto::favorites::{FavoriteCarList, ToggleFavoriteResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Car,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

/// Creates the (user, car) row if absent, deletes it otherwise. Two toggles
/// in a row always restore the original membership state.
pub async fn toggle_favorite(
    pool: &DbPool,
    user: &AuthUser,
    car_id: Uuid,
) -> AppResult<ApiResponse<ToggleFavoriteResponse>> {
    let car_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM cars WHERE id = $1")
        .bind(car_id)
        .fetch_optional(pool)
        .await?;
    if car_exists.is_none() {
        return Err(AppError::NotFound);
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE user_id = $1 AND car_id = $2")
            .bind(user.user_id)
            .bind(car_id)
            .fetch_optional(pool)
            .await?;

    let (is_favorite, message) = match existing {
        Some((favorite_id,)) => {
            sqlx::query("DELETE FROM favorites WHERE id = $1")
                .bind(favorite_id)
                .execute(pool)
                .await?;
            (false, "Removed from favorites".to_string())
        }
        None => {
            sqlx::query("INSERT INTO favorites (id, user_id, car_id) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(user.user_id)
                .bind(car_id)
                .execute(pool)
                .await?;
            (true, "Added to favorites".to_string())
        }
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        AuditAction::FavoriteToggle,
        Some(serde_json::json!({ "car_id": car_id, "is_favorite": is_favorite })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        message.clone(),
        ToggleFavoriteResponse {
            is_favorite,
            message,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_favorites(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteCarList>> {
    let (page, limit, offset) = pagination.normalize();
    let cars = sqlx::query_as::<_, Car>(
        r#"
        SELECT c.*
        FROM favorites f
        JOIN cars c ON c.id = f.car_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        FavoriteCarList { items: cars },
        Some(meta),
    ))
}

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{db::DbPool, middleware::auth::MaybeUser, state::AppState};

static UNREAD_MESSAGES: HeaderName = HeaderName::from_static("x-unread-messages");
static CART_COUNT: HeaderName = HeaderName::from_static("x-cart-count");
static FAVORITES_COUNT: HeaderName = HeaderName::from_static("x-favorites-count");

/// Attaches the viewer's unread-message, cart and favorites counts as
/// response headers on every authenticated API response. The counts are
/// read after the handler has run, so a mutating request sees its own
/// effect in the badges.
pub async fn navbar_counts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Some(user) = user {
        match fetch_counts(&state.pool, user.user_id).await {
            Ok((unread, cart, favorites)) => {
                let headers = response.headers_mut();
                if let Ok(value) = HeaderValue::from_str(&unread.to_string()) {
                    headers.insert(UNREAD_MESSAGES.clone(), value);
                }
                if let Ok(value) = HeaderValue::from_str(&cart.to_string()) {
                    headers.insert(CART_COUNT.clone(), value);
                }
                if let Ok(value) = HeaderValue::from_str(&favorites.to_string()) {
                    headers.insert(FAVORITES_COUNT.clone(), value);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to compute navbar counts");
            }
        }
    }

    response
}

async fn fetch_counts(pool: &DbPool, user_id: Uuid) -> Result<(i64, i64, i64), sqlx::Error> {
    let row: (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM messages m
             JOIN chats c ON c.id = m.chat_id
             WHERE NOT m.is_read
               AND m.sender_id <> $1
               AND (c.user1_id = $1 OR c.user2_id = $1)),
            (SELECT COUNT(*) FROM cart_items WHERE user_id = $1),
            (SELECT COUNT(*) FROM favorites WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

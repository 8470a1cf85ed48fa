use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cars;
pub mod cart;
pub mod chats;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod profiles;
pub mod reviews;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/cars", cars::router())
        .nest("/cart", cart::router())
        .nest("/favorites", favorites::router())
        .nest("/orders", orders::router())
        .nest("/sellers", profiles::sellers_router())
        .nest("/profile", profiles::router())
        .nest("/reviews", reviews::router())
        .nest("/chats", chats::router())
}

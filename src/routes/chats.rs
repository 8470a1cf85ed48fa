use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::chats::{ChatDetail, ChatList, SendMessageRequest, StartChatRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Chat,
    response::ApiResponse,
    services::chat_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chats).post(start_chat))
        .route("/{id}", get(open_chat))
        .route("/{id}/messages", post(send_message))
}

#[utoipa::path(
    post,
    path = "/api/chats",
    request_body = StartChatRequest,
    responses(
        (status = 200, description = "Existing or newly created chat", body = ApiResponse<Chat>),
        (status = 400, description = "Cannot chat with yourself"),
        (status = 404, description = "Seller or car not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chats"
)]
pub async fn start_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StartChatRequest>,
) -> AppResult<Json<ApiResponse<Chat>>> {
    let resp = chat_service::start_chat(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/chats",
    responses(
        (status = 200, description = "Conversations with unread counts, most recent first", body = ApiResponse<ChatList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Chats"
)]
pub async fn list_chats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ChatList>>> {
    let resp = chat_service::list_chats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/chats/{id}",
    params(
        ("id" = Uuid, Path, description = "Chat ID")
    ),
    responses(
        (status = 200, description = "Full conversation; the other side's unread messages become read", body = ApiResponse<ChatDetail>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Chat not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chats"
)]
pub async fn open_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ChatDetail>>> {
    let resp = chat_service::open_chat(&state, &user, id, None).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/chats/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Chat ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message appended, conversation returned", body = ApiResponse<ChatDetail>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Chat not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chats"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<ChatDetail>>> {
    let resp = chat_service::open_chat(&state, &user, id, Some(payload.text)).await?;
    Ok(Json(resp))
}

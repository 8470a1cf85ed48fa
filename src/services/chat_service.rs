use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::chats::{ChatDetail, ChatList, ChatSummary, StartChatRequest},
    entity::{
        Users,
        cars::Entity as Cars,
        chats::{ActiveModel as ChatActive, Column as ChatCol, Entity as Chats, Model as ChatModel},
        messages::{ActiveModel as MessageActive, Column as MsgCol, Entity as Messages, Model as MessageModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Chat, Message, PublicUser},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Orders a user pair deterministically (smaller id first) so that both
/// directions of a conversation resolve to the same chat row.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

pub async fn get_or_create_chat(
    state: &AppState,
    a: Uuid,
    b: Uuid,
    car_id: Option<Uuid>,
) -> AppResult<(ChatModel, bool)> {
    // A self-pair would violate the ordered-pair constraint on chats.
    if a == b {
        return Err(AppError::Rule(
            "You cannot start a chat with yourself".into(),
        ));
    }

    let (user1, user2) = canonical_pair(a, b);

    let mut finder = Chats::find()
        .filter(ChatCol::User1Id.eq(user1))
        .filter(ChatCol::User2Id.eq(user2));
    finder = match car_id {
        Some(car) => finder.filter(ChatCol::CarId.eq(car)),
        None => finder.filter(ChatCol::CarId.is_null()),
    };

    if let Some(chat) = finder.one(&state.orm).await? {
        return Ok((chat, false));
    }

    let chat = ChatActive {
        id: Set(Uuid::new_v4()),
        user1_id: Set(user1),
        user2_id: Set(user2),
        car_id: Set(car_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok((chat, true))
}

pub async fn start_chat(
    state: &AppState,
    user: &AuthUser,
    payload: StartChatRequest,
) -> AppResult<ApiResponse<Chat>> {
    if payload.seller_id == user.user_id {
        return Err(AppError::Rule(
            "You cannot start a chat with yourself".into(),
        ));
    }

    let seller = Users::find_by_id(payload.seller_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Cars::find_by_id(payload.car_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let (chat, created) =
        get_or_create_chat(state, user.user_id, payload.seller_id, Some(payload.car_id)).await?;

    if created {
        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            AuditAction::ChatStart,
            Some(serde_json::json!({ "chat_id": chat.id, "car_id": payload.car_id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
    }

    let message = if created {
        format!("Chat with {} created", seller.username)
    } else {
        "Chat".to_string()
    };

    Ok(ApiResponse::success(
        message,
        chat_from_entity(chat),
        Some(Meta::empty()),
    ))
}

pub async fn list_chats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ChatList>> {
    let chats = Chats::find()
        .filter(
            Condition::any()
                .add(ChatCol::User1Id.eq(user.user_id))
                .add(ChatCol::User2Id.eq(user.user_id)),
        )
        .order_by_desc(ChatCol::UpdatedAt)
        .all(&state.orm)
        .await?;

    let other_ids: Vec<Uuid> = chats
        .iter()
        .map(|chat| other_participant(chat, user.user_id))
        .collect();
    let others: HashMap<Uuid, String> = Users::find()
        .filter(crate::entity::users::Column::Id.is_in(other_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let mut items = Vec::with_capacity(chats.len());
    let mut total_unread = 0;

    for chat in chats {
        let other_id = other_participant(&chat, user.user_id);
        let Some(username) = others.get(&other_id) else {
            continue;
        };

        let last_message = Messages::find()
            .filter(MsgCol::ChatId.eq(chat.id))
            .order_by_desc(MsgCol::CreatedAt)
            .one(&state.orm)
            .await?
            .map(message_from_entity);

        let unread_count = Messages::find()
            .filter(MsgCol::ChatId.eq(chat.id))
            .filter(MsgCol::IsRead.eq(false))
            .filter(MsgCol::SenderId.ne(user.user_id))
            .count(&state.orm)
            .await? as i64;

        total_unread += unread_count;
        items.push(ChatSummary {
            chat: chat_from_entity(chat),
            other_user: PublicUser {
                id: other_id,
                username: username.clone(),
            },
            last_message,
            unread_count,
        });
    }

    Ok(ApiResponse::success(
        "Chats",
        ChatList {
            items,
            total_unread,
        },
        Some(Meta::empty()),
    ))
}

/// Opens a chat as `user`. Deliberately not read-only: every unread message
/// from the other participant is marked read, and a message is appended when
/// non-empty text is supplied.
pub async fn open_chat(
    state: &AppState,
    user: &AuthUser,
    chat_id: Uuid,
    text: Option<String>,
) -> AppResult<ApiResponse<ChatDetail>> {
    let chat = Chats::find_by_id(chat_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if chat.user1_id != user.user_id && chat.user2_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    Messages::update_many()
        .col_expr(MsgCol::IsRead, Expr::value(true))
        .filter(MsgCol::ChatId.eq(chat.id))
        .filter(MsgCol::IsRead.eq(false))
        .filter(MsgCol::SenderId.ne(user.user_id))
        .exec(&state.orm)
        .await?;

    let mut chat = chat;
    if let Some(text) = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        MessageActive {
            id: Set(Uuid::new_v4()),
            chat_id: Set(chat.id),
            sender_id: Set(user.user_id),
            text: Set(text),
            is_read: Set(false),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;

        let mut active: ChatActive = chat.into();
        active.updated_at = Set(Utc::now().into());
        chat = active.update(&state.orm).await?;

        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            AuditAction::MessageSend,
            Some(serde_json::json!({ "chat_id": chat.id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
    }

    let other_id = other_participant(&chat, user.user_id);
    let other = Users::find_by_id(other_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let messages = Messages::find()
        .filter(MsgCol::ChatId.eq(chat.id))
        .order_by_asc(MsgCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(message_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Chat",
        ChatDetail {
            chat: chat_from_entity(chat),
            other_user: PublicUser {
                id: other.id,
                username: other.username,
            },
            messages,
        },
        Some(Meta::empty()),
    ))
}

fn other_participant(chat: &ChatModel, user_id: Uuid) -> Uuid {
    if chat.user1_id == user_id {
        chat.user2_id
    } else {
        chat.user1_id
    }
}

fn chat_from_entity(model: ChatModel) -> Chat {
    Chat {
        id: model.id,
        user1_id: model.user1_id,
        user2_id: model.user2_id,
        car_id: model.car_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn message_from_entity(model: MessageModel) -> Message {
    Message {
        id: model.id,
        chat_id: model.chat_id,
        sender_id: model.sender_id,
        text: model.text,
        is_read: model.is_read,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

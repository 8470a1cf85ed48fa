use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Chat, Message, PublicUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartChatRequest {
    pub seller_id: Uuid,
    pub car_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatSummary {
    pub chat: Chat,
    pub other_user: PublicUser,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatList {
    pub items: Vec<ChatSummary>,
    pub total_unread: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatDetail {
    pub chat: Chat,
    pub other_user: PublicUser,
    pub messages: Vec<Message>,
}

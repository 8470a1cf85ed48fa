use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// The closed set of actions the marketplace records. Each knows the table
/// it is recorded against, so call sites only name the action.
#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    UserLogout,
    PasswordChange,
    ProfileUpdate,
    CarCreate,
    CarUpdate,
    CarDelete,
    FavoriteToggle,
    CartAdd,
    CartRemove,
    Checkout,
    ReviewCreate,
    ReviewUpdate,
    ReviewDelete,
    ChatStart,
    MessageSend,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::UserLogout => "user_logout",
            AuditAction::PasswordChange => "password_change",
            AuditAction::ProfileUpdate => "profile_update",
            AuditAction::CarCreate => "car_create",
            AuditAction::CarUpdate => "car_update",
            AuditAction::CarDelete => "car_delete",
            AuditAction::FavoriteToggle => "favorite_toggle",
            AuditAction::CartAdd => "cart_add",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::Checkout => "checkout",
            AuditAction::ReviewCreate => "review_create",
            AuditAction::ReviewUpdate => "review_update",
            AuditAction::ReviewDelete => "review_delete",
            AuditAction::ChatStart => "chat_start",
            AuditAction::MessageSend => "message_send",
        }
    }

    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister
            | AuditAction::UserLogin
            | AuditAction::UserLogout
            | AuditAction::PasswordChange
            | AuditAction::ProfileUpdate => "users",
            AuditAction::CarCreate | AuditAction::CarUpdate | AuditAction::CarDelete => "cars",
            AuditAction::FavoriteToggle => "favorites",
            AuditAction::CartAdd | AuditAction::CartRemove => "cart_items",
            AuditAction::Checkout => "orders",
            AuditAction::ReviewCreate | AuditAction::ReviewUpdate | AuditAction::ReviewDelete => {
                "reviews"
            }
            AuditAction::ChatStart => "chats",
            AuditAction::MessageSend => "messages",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

pub mod audit_logs;
pub mod cars;
pub mod cart_items;
pub mod chats;
pub mod favorites;
pub mod messages;
pub mod orders;
pub mod reviews;
pub mod user_profiles;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cars::Entity as Cars;
pub use cart_items::Entity as CartItems;
pub use chats::Entity as Chats;
pub use favorites::Entity as Favorites;
pub use messages::Entity as Messages;
pub use orders::Entity as Orders;
pub use reviews::Entity as Reviews;
pub use user_profiles::Entity as UserProfiles;
pub use users::Entity as Users;

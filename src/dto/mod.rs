pub mod auth;
pub mod cars;
pub mod cart;
pub mod chats;
pub mod favorites;
pub mod orders;
pub mod profiles;
pub mod reviews;

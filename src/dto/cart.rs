use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Car;

#[derive(Debug, Serialize, ToSchema)]
pub struct CartEntry {
    pub id: Uuid,
    pub car: Car,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    /// Sum of the listed prices, in minor units.
    pub total_price: i64,
}

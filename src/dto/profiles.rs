use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{orders::OrderWithCar, reviews::ReviewWithBuyer},
    models::{Car, PublicUser},
};

/// Seller metrics recomputed on every read; never cached.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileMetrics {
    /// Mean review rating rounded to one decimal; `None` without reviews.
    pub average_rating: Option<f64>,
    pub reviews_count: i64,
    pub sales_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerProfile {
    pub seller: PublicUser,
    pub metrics: ProfileMetrics,
    pub cars_for_sale: Vec<Car>,
    pub reviews: Vec<ReviewWithBuyer>,
    /// Completed purchases the viewer may still review; empty for anonymous
    /// viewers and for the seller themselves.
    pub reviewable_orders: Vec<OrderWithCar>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub metrics: ProfileMetrics,
    pub reviews: Vec<ReviewWithBuyer>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

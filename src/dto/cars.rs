use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Car;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCarRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCarRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CarList {
    pub items: Vec<Car>,
    /// Distinct brands among available listings, for the filter dropdown.
    pub brands: Vec<String>,
    /// Car ids the viewer has favorited; empty for anonymous viewers.
    pub favorite_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerSummary {
    pub id: Uuid,
    pub username: String,
    pub average_rating: Option<f64>,
    pub reviews_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CarDetail {
    pub car: Car,
    pub is_favorite: bool,
    pub seller: Option<SellerSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyListings {
    pub items: Vec<Car>,
}

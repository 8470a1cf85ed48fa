use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Car;

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleFavoriteResponse {
    pub is_favorite: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FavoriteCarList {
    #[schema(value_type = Vec<Car>)]
    pub items: Vec<Car>,
}

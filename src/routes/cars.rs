use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::cars::{CarDetail, CarList, CreateCarRequest, MyListings, UpdateCarRequest},
    error::AppResult,
    middleware::auth::{AuthUser, MaybeUser},
    models::Car,
    response::ApiResponse,
    routes::params::CarQuery,
    services::car_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/mine", get(my_listings))
        .route("/{id}", get(get_car))
        .route("/{id}", put(update_car))
        .route("/{id}", delete(delete_car))
}

#[utoipa::path(
    get,
    path = "/api/cars",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("price_min" = Option<i64>, Query, description = "Minimum price in minor units"),
        ("price_max" = Option<i64>, Query, description = "Maximum price in minor units"),
        ("year_min" = Option<i32>, Query, description = "Minimum model year"),
        ("year_max" = Option<i32>, Query, description = "Maximum model year"),
        ("brand" = Option<String>, Query, description = "Brand substring, case-insensitive"),
        ("sort_by" = Option<String>, Query, description = "Sort key: created_at, price, year"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Available cars", body = ApiResponse<CarList>)
    ),
    tag = "Cars"
)]
pub async fn list_cars(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<CarQuery>,
) -> AppResult<Json<ApiResponse<CarList>>> {
    let resp = car_service::list_cars(&state, query, viewer.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 200, description = "Car detail", body = ApiResponse<CarDetail>),
        (status = 404, description = "Car not found"),
    ),
    tag = "Cars"
)]
pub async fn get_car(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CarDetail>>> {
    let resp = car_service::get_car(&state, id, viewer.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cars/mine",
    responses(
        (status = 200, description = "Own listings, sold ones included", body = ApiResponse<MyListings>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn my_listings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MyListings>>> {
    let resp = car_service::my_listings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cars",
    request_body = CreateCarRequest,
    responses(
        (status = 200, description = "Listing created", body = ApiResponse<Car>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn create_car(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCarRequest>,
) -> AppResult<Json<ApiResponse<Car>>> {
    let resp = car_service::create_car(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cars/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    request_body = UpdateCarRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<Car>),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Car not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn update_car(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCarRequest>,
) -> AppResult<Json<ApiResponse<Car>>> {
    let resp = car_service::update_car(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cars/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 200, description = "Listing deleted"),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Car not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn delete_car(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = car_service::delete_car(&state, &user, id).await?;
    Ok(Json(resp))
}

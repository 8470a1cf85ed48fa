use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::OrderList,
        profiles::{MyProfile, SellerProfile, UpdateProfileRequest},
    },
    error::AppResult,
    middleware::auth::{AuthUser, MaybeUser},
    response::{ApiResponse, Meta},
    services::{profile_service, review_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(my_profile))
        .route("/", put(update_profile))
}

pub fn sellers_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(seller_profile))
        .route("/{id}/reviewable-orders", get(reviewable_orders))
}

#[utoipa::path(
    get,
    path = "/api/sellers/{id}",
    params(
        ("id" = Uuid, Path, description = "Seller's user ID")
    ),
    responses(
        (status = 200, description = "Public seller page with rating, listings and reviews", body = ApiResponse<SellerProfile>),
        (status = 404, description = "Seller not found"),
    ),
    tag = "Profiles"
)]
pub async fn seller_profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SellerProfile>>> {
    let resp = profile_service::seller_profile(&state, id, viewer.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/{id}/reviewable-orders",
    params(
        ("id" = Uuid, Path, description = "Seller's user ID")
    ),
    responses(
        (status = 200, description = "Completed purchases from this seller still awaiting a review", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profiles"
)]
pub async fn reviewable_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let items = review_service::reviewable_orders(&state, &user, id).await?;
    Ok(Json(ApiResponse::success(
        "Reviewable orders",
        OrderList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Own account with seller metrics", body = ApiResponse<MyProfile>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profiles"
)]
pub async fn my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MyProfile>>> {
    let resp = profile_service::my_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<MyProfile>),
        (status = 400, description = "Username or email already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profiles"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<MyProfile>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::{
        orders::OrderWithCar,
        reviews::{CreateReviewRequest, UpdateReviewRequest},
    },
    entity::{
        cars::Entity as Cars,
        orders::{Column as OrderCol, Entity as Orders},
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Review, order_status},
    response::{ApiResponse, Meta},
    services::{car_service::car_from_entity, order_service::order_from_entity},
    state::AppState,
};

/// Completed purchases by `buyer` from `seller` that have no review yet.
pub async fn reviewable_orders(
    state: &AppState,
    buyer: &AuthUser,
    seller_id: Uuid,
) -> AppResult<Vec<OrderWithCar>> {
    let rows = Orders::find()
        .filter(OrderCol::UserId.eq(buyer.user_id))
        .filter(OrderCol::Status.eq(order_status::COMPLETED))
        .find_also_related(Cars)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let candidates: Vec<(crate::entity::orders::Model, crate::entity::cars::Model)> = rows
        .into_iter()
        .filter_map(|(order, car)| car.map(|car| (order, car)))
        .filter(|(_, car)| car.seller_id == Some(seller_id))
        .collect();

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = candidates.iter().map(|(order, _)| order.id).collect();
    let reviewed: Vec<Uuid> = Reviews::find()
        .filter(ReviewCol::OrderId.is_in(order_ids))
        .select_only()
        .column(ReviewCol::OrderId)
        .into_tuple()
        .all(&state.orm)
        .await?;

    Ok(candidates
        .into_iter()
        .filter(|(order, _)| !reviewed.contains(&order.id))
        .map(|(order, car)| OrderWithCar {
            order: order_from_entity(order),
            car: car_from_entity(car),
        })
        .collect())
}

pub async fn create_review(
    state: &AppState,
    buyer: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if payload.seller_id == buyer.user_id {
        return Err(AppError::Forbidden);
    }
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
    }

    // The order must be the buyer's own completed purchase of a car this
    // seller was selling.
    let row = Orders::find_by_id(payload.order_id)
        .filter(OrderCol::UserId.eq(buyer.user_id))
        .filter(OrderCol::Status.eq(order_status::COMPLETED))
        .find_also_related(Cars)
        .one(&state.orm)
        .await?;

    let (order, car) = match row {
        Some((order, Some(car))) => (order, car),
        _ => return Err(AppError::NotFound),
    };

    if car.seller_id != Some(payload.seller_id) {
        return Err(AppError::NotFound);
    }

    let duplicate = Reviews::find()
        .filter(ReviewCol::OrderId.eq(order.id))
        .count(&state.orm)
        .await?;
    if duplicate > 0 {
        return Err(AppError::Rule(
            "You have already reviewed this order".into(),
        ));
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(payload.seller_id),
        buyer_id: Set(buyer.user_id),
        order_id: Set(order.id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(buyer.user_id),
        AuditAction::ReviewCreate,
        Some(serde_json::json!({ "review_id": review.id, "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Thank you for your review!",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.buyer_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
        }
    }

    let mut active: ReviewActive = existing.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment);
    }
    active.updated_at = Set(Utc::now().into());

    let review = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ReviewUpdate,
        Some(serde_json::json!({ "review_id": review.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review updated",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.buyer_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    Reviews::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ReviewDelete,
        Some(serde_json::json!({ "review_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        seller_id: model.seller_id,
        buyer_id: model.buyer_id,
        order_id: model.order_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

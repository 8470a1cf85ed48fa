use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::cars::{CarDetail, CarList, CreateCarRequest, MyListings, SellerSummary, UpdateCarRequest},
    entity::{
        Users,
        cars::{ActiveModel, Column, Entity as Cars, Model as CarModel},
        favorites::{Column as FavCol, Entity as Favorites},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Car,
    response::{ApiResponse, Meta},
    routes::params::{CarQuery, CarSortBy, SortOrder},
    services::profile_service,
    state::AppState,
};

pub async fn list_cars(
    state: &AppState,
    query: CarQuery,
    viewer: Option<&AuthUser>,
) -> AppResult<ApiResponse<CarList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(Column::Available.eq(true));

    if let Some(price_min) = query.price_min {
        condition = condition.add(Column::Price.gte(price_min));
    }
    if let Some(price_max) = query.price_max {
        condition = condition.add(Column::Price.lte(price_max));
    }
    if let Some(year_min) = query.year_min {
        condition = condition.add(Column::Year.gte(year_min));
    }
    if let Some(year_max) = query.year_max {
        condition = condition.add(Column::Year.lte(year_max));
    }
    if let Some(brand) = query.brand.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", brand);
        condition = condition.add(Expr::col(Column::Brand).ilike(pattern));
    }

    let sort_by = query.sort_by.unwrap_or(CarSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        CarSortBy::CreatedAt => Column::CreatedAt,
        CarSortBy::Price => Column::Price,
        CarSortBy::Year => Column::Year,
    };

    let mut finder = Cars::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items: Vec<Car> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(car_from_entity)
        .collect();

    let brands: Vec<String> = Cars::find()
        .filter(Column::Available.eq(true))
        .select_only()
        .column(Column::Brand)
        .distinct()
        .order_by_asc(Column::Brand)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let favorite_ids: Vec<Uuid> = match viewer {
        Some(user) => {
            Favorites::find()
                .filter(FavCol::UserId.eq(user.user_id))
                .select_only()
                .column(FavCol::CarId)
                .into_tuple()
                .all(&state.orm)
                .await?
        }
        None => Vec::new(),
    };

    let meta = Meta::new(page, limit, total);
    let data = CarList {
        items,
        brands,
        favorite_ids,
    };
    Ok(ApiResponse::success("Cars", data, Some(meta)))
}

pub async fn get_car(
    state: &AppState,
    id: Uuid,
    viewer: Option<&AuthUser>,
) -> AppResult<ApiResponse<CarDetail>> {
    let car = Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_favorite = match viewer {
        Some(user) => {
            Favorites::find()
                .filter(FavCol::UserId.eq(user.user_id))
                .filter(FavCol::CarId.eq(id))
                .count(&state.orm)
                .await?
                > 0
        }
        None => false,
    };

    let seller = match car.seller_id {
        Some(seller_id) => {
            let seller = Users::find_by_id(seller_id).one(&state.orm).await?;
            match seller {
                Some(seller) => {
                    let (average_rating, reviews_count) =
                        profile_service::seller_rating(&state.pool, seller_id).await?;
                    Some(SellerSummary {
                        id: seller.id,
                        username: seller.username,
                        average_rating,
                        reviews_count,
                    })
                }
                None => None,
            }
        }
        None => None,
    };

    let data = CarDetail {
        car: car_from_entity(car),
        is_favorite,
        seller,
    };
    Ok(ApiResponse::success("Car", data, None))
}

/// All of the seller's listings, sold ones included.
pub async fn my_listings(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MyListings>> {
    let items = Cars::find()
        .filter(Column::SellerId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(car_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "My listings",
        MyListings { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_car(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCarRequest,
) -> AppResult<ApiResponse<Car>> {
    if payload.price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if payload.brand.trim().is_empty() || payload.model.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Brand and model must not be empty".into(),
        ));
    }

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        brand: Set(payload.brand),
        model: Set(payload.model),
        year: Set(payload.year),
        price: Set(payload.price),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        available: Set(true),
        seller_id: Set(Some(user.user_id)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let car = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CarCreate,
        Some(serde_json::json!({ "car_id": car.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Listing created",
        car_from_entity(car),
        Some(Meta::empty()),
    ))
}

pub async fn update_car(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCarRequest,
) -> AppResult<ApiResponse<Car>> {
    let existing = Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.seller_id != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }

    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("Price must not be negative".into()));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(brand) = payload.brand {
        active.brand = Set(brand);
    }
    if let Some(model) = payload.model {
        active.model = Set(model);
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    active.updated_at = Set(Utc::now().into());

    let car = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CarUpdate,
        Some(serde_json::json!({ "car_id": car.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Listing updated",
        car_from_entity(car),
        Some(Meta::empty()),
    ))
}

pub async fn delete_car(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.seller_id != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }

    Cars::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CarDelete,
        Some(serde_json::json!({ "car_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Listing deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn car_from_entity(model: CarModel) -> Car {
    Car {
        id: model.id,
        brand: model.brand,
        model: model.model,
        year: model.year,
        price: model.price,
        description: model.description,
        image_url: model.image_url,
        available: model.available,
        seller_id: model.seller_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

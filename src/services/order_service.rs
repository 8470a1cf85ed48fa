use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::orders::{CheckoutResponse, OrderList, OrderWithCar},
    entity::{
        Users,
        cars::{Column as CarCol, Entity as Cars},
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    mailer::CarSummary,
    middleware::auth::AuthUser,
    models::{Order, order_status},
    response::{ApiResponse, Meta},
    services::car_service::car_from_entity,
    state::AppState,
};

/// Converts every still-available car in the user's cart into a completed
/// order. Cars bought out from under the user are skipped rather than
/// failing the whole checkout; their cart rows stay behind. The
/// confirmation email goes out after commit and its failure is only a
/// warning in the response.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let txn = state.orm.begin().await?;

    let cart_rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&txn)
        .await?;

    if cart_rows.is_empty() {
        return Err(AppError::Rule("Your cart is empty".into()));
    }

    let mut orders: Vec<Order> = Vec::new();
    let mut summaries: Vec<CarSummary> = Vec::new();

    for item in &cart_rows {
        // Atomic availability flip: zero rows affected means a concurrent
        // buyer already won this car.
        let flipped = Cars::update_many()
            .col_expr(CarCol::Available, Expr::value(false))
            .col_expr(CarCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(CarCol::Id.eq(item.car_id))
            .filter(CarCol::Available.eq(true))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            continue;
        }

        let car = Cars::find_by_id(item.car_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            car_id: Set(item.car_id),
            status: Set(order_status::COMPLETED.into()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        CartItems::delete_by_id(item.id).exec(&txn).await?;

        summaries.push(CarSummary {
            brand: car.brand,
            model: car.model,
            year: car.year,
            price: car.price,
        });
        orders.push(order_from_entity(order));
    }

    if orders.is_empty() {
        txn.rollback().await?;
        return Err(AppError::Rule("Could not place the order".into()));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::Checkout,
        Some(serde_json::json!({
            "order_ids": orders.iter().map(|o| o.id).collect::<Vec<_>>()
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let mut mail_warning = None;
    if let Some(account) = Users::find_by_id(user.user_id).one(&state.orm).await? {
        if let Err(err) = state
            .mailer
            .send_order_confirmation(&account.email, &account.username, orders[0].id, &summaries)
            .await
        {
            tracing::warn!(error = %err, "order confirmation email failed");
            mail_warning = Some(format!(
                "Order placed, but the confirmation email could not be sent: {err}"
            ));
        }
    }

    let message = match &mail_warning {
        Some(warning) => warning.clone(),
        None => "Order placed successfully".to_string(),
    };

    Ok(ApiResponse::success(
        message,
        CheckoutResponse {
            orders,
            mail_warning,
        },
        Some(Meta::empty()),
    ))
}

pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let rows = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .find_also_related(Cars)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .filter_map(|(order, car)| {
            car.map(|car| OrderWithCar {
                order: order_from_entity(order),
                car: car_from_entity(car),
            })
        })
        .collect();

    Ok(ApiResponse::success(
        "My orders",
        OrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn order_success(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderWithCar>> {
    let row = Orders::find_by_id(order_id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .find_also_related(Cars)
        .one(&state.orm)
        .await?;

    let (order, car) = match row {
        Some((order, Some(car))) => (order, car),
        _ => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Order",
        OrderWithCar {
            order: order_from_entity(order),
            car: car_from_entity(car),
        },
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        car_id: model.car_id,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

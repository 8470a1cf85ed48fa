use carshop_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cars::CreateCarRequest,
    entity::users::ActiveModel as UserActive,
    error::AppError,
    mailer::{Mailer, format_price},
    middleware::auth::AuthUser,
    models::order_status,
    routes::params::{CarQuery, Pagination},
    services::{car_service, cart_service, favorite_service, order_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: seller lists cars -> buyer favorites, carts and buys,
// including the cases where a car disappears under the buyer.
#[tokio::test]
async fn browse_cart_and_checkout_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, "flow_seller", "flow_seller@example.com").await?;
    let buyer = create_user(&state, "flow_buyer", "flow_buyer@example.com").await?;

    let car = car_service::create_car(
        &state,
        &seller,
        CreateCarRequest {
            brand: "BMW".into(),
            model: "X5".into(),
            year: 2019,
            price: 3_450_000,
            description: Some("Well maintained".into()),
            image_url: None,
        },
    )
    .await?
    .data
    .expect("created car");

    // Double toggle returns the favorite to its original absence.
    let toggled = favorite_service::toggle_favorite(&state.pool, &buyer, car.id)
        .await?
        .data
        .unwrap();
    assert!(toggled.is_favorite);
    let toggled = favorite_service::toggle_favorite(&state.pool, &buyer, car.id)
        .await?
        .data
        .unwrap();
    assert!(!toggled.is_favorite);

    // Adding twice is not an error, the second call just reports the duplicate.
    cart_service::add_to_cart(&state.pool, &buyer, car.id).await?;
    let again = cart_service::add_to_cart(&state.pool, &buyer, car.id).await?;
    assert_eq!(again.message, "This car is already in your cart");

    let checkout = order_service::checkout(&state, &buyer).await?.data.unwrap();
    assert_eq!(checkout.orders.len(), 1);
    assert_eq!(checkout.orders[0].status, order_status::COMPLETED);
    assert_eq!(checkout.orders[0].car_id, car.id);

    // The car is sold now.
    let sold = carshop_api::entity::Cars::find_by_id(car.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert!(!sold.available);

    // The seller still sees the sold car among their listings, the public
    // browse list no longer does.
    let mine = car_service::my_listings(&state, &seller).await?.data.unwrap();
    assert!(mine.items.iter().any(|c| c.id == car.id));
    let public = car_service::list_cars(&state, default_query(), None)
        .await?
        .data
        .unwrap();
    assert!(public.items.iter().all(|c| c.id != car.id));

    // The cart was emptied, so another checkout has nothing to do.
    let err = order_service::checkout(&state, &buyer).await.unwrap_err();
    assert!(matches!(err, AppError::Rule(_)));

    // A sold car cannot be carted again.
    let err = cart_service::add_to_cart(&state.pool, &buyer, car.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rule(_)));

    // Two cars in the cart, one bought out from under the buyer: checkout
    // takes the one still available and leaves the other cart row behind.
    let mut car_ids = Vec::new();
    for model in ["Golf", "Passat"] {
        let car = car_service::create_car(
            &state,
            &seller,
            CreateCarRequest {
                brand: "Volkswagen".into(),
                model: model.into(),
                year: 2018,
                price: 1_200_000,
                description: None,
                image_url: None,
            },
        )
        .await?
        .data
        .unwrap();
        cart_service::add_to_cart(&state.pool, &buyer, car.id).await?;
        car_ids.push(car.id);
    }

    sqlx::query("UPDATE cars SET available = FALSE WHERE id = $1")
        .bind(car_ids[1])
        .execute(&state.pool)
        .await?;

    let checkout = order_service::checkout(&state, &buyer).await?.data.unwrap();
    assert_eq!(checkout.orders.len(), 1);
    assert_eq!(checkout.orders[0].car_id, car_ids[0]);

    let leftover: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1 AND car_id = $2")
            .bind(buyer.user_id)
            .bind(car_ids[1])
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(leftover.0, 1);

    // With only the gone car left, checkout places nothing and fails.
    let err = order_service::checkout(&state, &buyer).await.unwrap_err();
    assert!(matches!(err, AppError::Rule(_)));

    Ok(())
}

fn default_query() -> CarQuery {
    CarQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        price_min: None,
        price_max: None,
        year_min: None,
        year_max: None,
        brand: None,
        sort_by: None,
        sort_order: None,
    }
}

#[test]
fn price_formatting_uses_two_decimals() {
    assert_eq!(format_price(3_450_000), "34500.00");
    assert_eq!(format_price(105), "1.05");
    assert_eq!(format_price(0), "0.00");
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE messages, chats, reviews, orders, cart_items, favorites, user_profiles, audit_logs, cars, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        pool,
        orm,
        mailer: Mailer::disabled(),
    }))
}

async fn create_user(state: &AppState, username: &str, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        username: user.username,
    })
}

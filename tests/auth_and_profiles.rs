use carshop_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        auth::{ChangePasswordRequest, LoginRequest, RegisterRequest},
        cars::CreateCarRequest,
        profiles::UpdateProfileRequest,
        reviews::CreateReviewRequest,
    },
    error::AppError,
    mailer::Mailer,
    middleware::auth::AuthUser,
    services::{auth_service, car_service, cart_service, order_service, profile_service, review_service},
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};

// Integration flow: account lifecycle plus the seller page numbers that are
// recomputed from reviews and completed sales.
#[tokio::test]
async fn account_and_seller_profile_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    // Weak or mismatched registrations are rejected.
    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "ap_seller".into(),
            email: "ap_seller@example.com".into(),
            password: "short".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let seller = register(&state, "ap_seller", "ap_seller@example.com").await?;
    let buyer = register(&state, "ap_buyer", "ap_buyer@example.com").await?;

    // Duplicate username is refused.
    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "ap_seller".into(),
            email: "other@example.com".into(),
            password: "password123".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Wrong password fails, right one logs in.
    let err = auth_service::login_user(
        &state.pool,
        LoginRequest {
            username: "ap_seller".into(),
            password: "wrongpassword".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let login = auth_service::login_user(
        &state.pool,
        LoginRequest {
            username: "ap_seller".into(),
            password: "password123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(login.token.starts_with("Bearer "));

    // Password change requires the current password and a confirmed new one.
    let err = auth_service::change_password(
        &state.pool,
        &seller,
        ChangePasswordRequest {
            old_password: "password123".into(),
            new_password1: "newpassword1".into(),
            new_password2: "different".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    auth_service::change_password(
        &state.pool,
        &seller,
        ChangePasswordRequest {
            old_password: "password123".into(),
            new_password1: "newpassword1".into(),
            new_password2: "newpassword1".into(),
        },
    )
    .await?;

    auth_service::login_user(
        &state.pool,
        LoginRequest {
            username: "ap_seller".into(),
            password: "newpassword1".into(),
        },
    )
    .await?;

    // Two sales, two reviews: the seller page shows the rounded average.
    let mut order_ids = Vec::new();
    for model in ["320i", "520d"] {
        let car = car_service::create_car(
            &state,
            &seller,
            CreateCarRequest {
                brand: "BMW".into(),
                model: model.into(),
                year: 2020,
                price: 2_500_000,
                description: None,
                image_url: None,
            },
        )
        .await?
        .data
        .unwrap();
        cart_service::add_to_cart(&state.pool, &buyer, car.id).await?;
    }
    let checkout = order_service::checkout(&state, &buyer).await?.data.unwrap();
    for order in &checkout.orders {
        order_ids.push(order.id);
    }
    assert_eq!(order_ids.len(), 2);

    for (order_id, rating) in order_ids.iter().zip([4, 5]) {
        review_service::create_review(
            &state,
            &buyer,
            CreateReviewRequest {
                seller_id: seller.user_id,
                order_id: *order_id,
                rating,
                comment: "Good seller".into(),
            },
        )
        .await?;
    }

    let profile = profile_service::seller_profile(&state, seller.user_id, Some(&buyer))
        .await?
        .data
        .unwrap();
    assert_eq!(profile.metrics.average_rating, Some(4.5));
    assert_eq!(profile.metrics.reviews_count, 2);
    assert_eq!(profile.metrics.sales_count, 2);
    assert!(profile.cars_for_sale.is_empty());
    assert!(profile.reviewable_orders.is_empty());

    // Renaming to a taken username is refused, a free one goes through.
    let err = profile_service::update_profile(
        &state,
        &buyer,
        UpdateProfileRequest {
            username: Some("ap_seller".into()),
            email: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let updated = profile_service::update_profile(
        &state,
        &buyer,
        UpdateProfileRequest {
            username: Some("ap_buyer_renamed".into()),
            email: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.username, "ap_buyer_renamed");

    Ok(())
}

async fn register(state: &AppState, username: &str, email: &str) -> anyhow::Result<AuthUser> {
    let resp = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "password123".into(),
        },
    )
    .await?;
    let auth = resp.data.expect("auth payload");

    let row: (uuid::Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(&state.pool)
        .await?;

    Ok(AuthUser {
        user_id: row.0,
        username: auth.username,
    })
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

    if std::env::var("JWT_SECRET").is_err() {
        // Token issuance reads the secret from the environment.
        unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
    }

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

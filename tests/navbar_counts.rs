use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
};
use carshop_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{auth::RegisterRequest, cars::CreateCarRequest},
    mailer::Mailer,
    middleware::{auth::AuthUser, context::navbar_counts},
    routes::create_api_router,
    services::{auth_service, car_service},
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};
use tower::ServiceExt;

// The count headers are computed after the handler, so a mutating request
// already sees its own effect in the badges.
#[tokio::test]
async fn count_headers_reflect_the_requests_own_mutation() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let app = Router::new()
        .nest(
            "/api",
            create_api_router().layer(middleware::from_fn_with_state(
                state.clone(),
                navbar_counts,
            )),
        )
        .with_state(state.clone());

    let (seller, _) = register(&state, "hdr_seller", "hdr_seller@example.com").await?;
    let (_, buyer_token) = register(&state, "hdr_buyer", "hdr_buyer@example.com").await?;

    let car = car_service::create_car(
        &state,
        &seller,
        CreateCarRequest {
            brand: "Audi".into(),
            model: "A4".into(),
            year: 2020,
            price: 2_100_000,
            description: None,
            image_url: None,
        },
    )
    .await?
    .data
    .unwrap();

    // Adding to the cart must already be counted on this very response.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/cart/{}", car.id))
                .header(header::AUTHORIZATION, buyer_token.as_str())
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-cart-count").unwrap(), "1");
    assert_eq!(response.headers().get("x-favorites-count").unwrap(), "0");
    assert_eq!(response.headers().get("x-unread-messages").unwrap(), "0");

    // Same for the favorite toggle.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/favorites/{}/toggle", car.id))
                .header(header::AUTHORIZATION, buyer_token.as_str())
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-favorites-count").unwrap(), "1");
    assert_eq!(response.headers().get("x-cart-count").unwrap(), "1");

    // And the removal drops the badge on the removing response itself.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/cart/{}", car.id))
                .header(header::AUTHORIZATION, buyer_token.as_str())
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-cart-count").unwrap(), "0");

    // Anonymous responses carry no badges at all.
    let response = app
        .oneshot(Request::builder().uri("/api/cars").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-cart-count").is_none());
    assert!(response.headers().get("x-favorites-count").is_none());
    assert!(response.headers().get("x-unread-messages").is_none());

    Ok(())
}

async fn register(
    state: &AppState,
    username: &str,
    email: &str,
) -> anyhow::Result<(AuthUser, String)> {
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

    Ok((
        AuthUser {
            user_id: row.0,
            username: auth.username,
        },
        auth.token,
    ))
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

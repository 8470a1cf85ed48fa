use carshop_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cars::CreateCarRequest,
        chats::StartChatRequest,
        reviews::CreateReviewRequest,
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    mailer::Mailer,
    middleware::auth::AuthUser,
    services::{car_service, cart_service, chat_service, order_service, review_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: a completed purchase unlocks exactly one review, and a
// conversation between buyer and seller tracks unread messages.
#[tokio::test]
async fn review_gating_and_chat_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, "rc_seller", "rc_seller@example.com").await?;
    let buyer = create_user(&state, "rc_buyer", "rc_buyer@example.com").await?;

    let car = car_service::create_car(
        &state,
        &seller,
        CreateCarRequest {
            brand: "Toyota".into(),
            model: "Corolla".into(),
            year: 2021,
            price: 1_890_000,
            description: None,
            image_url: None,
        },
    )
    .await?
    .data
    .unwrap();

    // No purchase yet, so nothing is reviewable and a review is rejected.
    let reviewable = review_service::reviewable_orders(&state, &buyer, seller.user_id).await?;
    assert!(reviewable.is_empty());
    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            seller_id: seller.user_id,
            order_id: Uuid::new_v4(),
            rating: 5,
            comment: "Great".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    cart_service::add_to_cart(&state.pool, &buyer, car.id).await?;
    let order = order_service::checkout(&state, &buyer).await?.data.unwrap().orders[0].clone();

    let reviewable = review_service::reviewable_orders(&state, &buyer, seller.user_id).await?;
    assert_eq!(reviewable.len(), 1);
    assert_eq!(reviewable[0].order.id, order.id);

    // Rating bounds are enforced.
    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            seller_id: seller.user_id,
            order_id: order.id,
            rating: 6,
            comment: "Too good".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Sellers cannot review themselves.
    let err = review_service::create_review(
        &state,
        &seller,
        CreateReviewRequest {
            seller_id: seller.user_id,
            order_id: order.id,
            rating: 5,
            comment: "I am great".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let review = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            seller_id: seller.user_id,
            order_id: order.id,
            rating: 4,
            comment: "Smooth deal".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(review.rating, 4);

    // The order is spent; a second review on it is rejected.
    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            seller_id: seller.user_id,
            order_id: order.id,
            rating: 1,
            comment: "Changed my mind".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Rule(_)));

    let reviewable = review_service::reviewable_orders(&state, &buyer, seller.user_id).await?;
    assert!(reviewable.is_empty());

    // Chat: starting twice lands in the same conversation.
    let chat = chat_service::start_chat(
        &state,
        &buyer,
        StartChatRequest {
            seller_id: seller.user_id,
            car_id: car.id,
        },
    )
    .await?
    .data
    .unwrap();
    let same = chat_service::start_chat(
        &state,
        &buyer,
        StartChatRequest {
            seller_id: seller.user_id,
            car_id: car.id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(chat.id, same.id);
    assert!(chat.user1_id <= chat.user2_id);

    let err = chat_service::start_chat(
        &state,
        &buyer,
        StartChatRequest {
            seller_id: buyer.user_id,
            car_id: car.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Rule(_)));

    // Even below the route layer a self-pair never reaches the database,
    // where it would break the ordered-pair constraint.
    let err = chat_service::get_or_create_chat(&state, buyer.user_id, buyer.user_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rule(_)));

    // Buyer writes; the seller sees one unread conversation.
    chat_service::open_chat(&state, &buyer, chat.id, Some("Is it still for sale?".into())).await?;

    let seller_chats = chat_service::list_chats(&state, &seller).await?.data.unwrap();
    assert_eq!(seller_chats.total_unread, 1);
    assert_eq!(seller_chats.items[0].unread_count, 1);

    // Opening the chat clears the badge.
    let detail = chat_service::open_chat(&state, &seller, chat.id, None).await?.data.unwrap();
    assert_eq!(detail.messages.len(), 1);
    assert_eq!(detail.other_user.id, buyer.user_id);

    let seller_chats = chat_service::list_chats(&state, &seller).await?.data.unwrap();
    assert_eq!(seller_chats.total_unread, 0);

    // Outsiders cannot read the conversation.
    let outsider = create_user(&state, "rc_outsider", "rc_outsider@example.com").await?;
    let err = chat_service::open_chat(&state, &outsider, chat.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[test]
fn chat_pairs_are_ordered() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    assert_eq!(
        chat_service::canonical_pair(a, b),
        chat_service::canonical_pair(b, a)
    );
    let (first, second) = chat_service::canonical_pair(a, b);
    assert!(first <= second);
    assert_eq!(chat_service::canonical_pair(a, a), (a, a));
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

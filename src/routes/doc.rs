use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest},
        cars::{CarDetail, CarList, CreateCarRequest, MyListings, SellerSummary, UpdateCarRequest},
        cart::{CartEntry, CartView},
        chats::{ChatDetail, ChatList, ChatSummary, SendMessageRequest, StartChatRequest},
        favorites::{FavoriteCarList, ToggleFavoriteResponse},
        orders::{CheckoutResponse, OrderList, OrderWithCar},
        profiles::{MyProfile, ProfileMetrics, SellerProfile, UpdateProfileRequest},
        reviews::{CreateReviewRequest, ReviewWithBuyer, UpdateReviewRequest},
    },
    models::{Car, CartItem, Chat, Favorite, Message, Order, PublicUser, Review, User},
    response::{ApiResponse, Meta},
    routes::{auth, cars, cart, chats, favorites, health, orders, params, profiles, reviews},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::change_password,
        cars::list_cars,
        cars::get_car,
        cars::my_listings,
        cars::create_car,
        cars::update_car,
        cars::delete_car,
        cart::list_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        favorites::list_favorites,
        favorites::toggle_favorite,
        orders::checkout,
        orders::my_orders,
        orders::order_success,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        profiles::seller_profile,
        profiles::reviewable_orders,
        profiles::my_profile,
        profiles::update_profile,
        chats::start_chat,
        chats::list_chats,
        chats::open_chat,
        chats::send_message
    ),
    components(
        schemas(
            User,
            PublicUser,
            Car,
            Favorite,
            CartItem,
            Order,
            Review,
            Chat,
            Message,
            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            AuthResponse,
            CreateCarRequest,
            UpdateCarRequest,
            CarList,
            CarDetail,
            MyListings,
            SellerSummary,
            CartEntry,
            CartView,
            FavoriteCarList,
            ToggleFavoriteResponse,
            OrderWithCar,
            OrderList,
            CheckoutResponse,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewWithBuyer,
            ProfileMetrics,
            SellerProfile,
            MyProfile,
            UpdateProfileRequest,
            StartChatRequest,
            SendMessageRequest,
            ChatSummary,
            ChatList,
            ChatDetail,
            params::Pagination,
            params::CarQuery,
            Meta,
            ApiResponse<Car>,
            ApiResponse<CarList>,
            ApiResponse<CartView>,
            ApiResponse<OrderList>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<SellerProfile>,
            ApiResponse<ChatList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Cars", description = "Car listing endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Reviews", description = "Seller review endpoints"),
        (name = "Profiles", description = "Profile endpoints"),
        (name = "Chats", description = "Buyer/seller chat endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

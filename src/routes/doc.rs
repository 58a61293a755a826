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
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, CartList, UpdateCartItemRequest},
        meals::{CategoryList, CreateMealRequest, MealList, UpdateMealRequest},
        orders::{
            CreateOrderRequest, CustomerInfo, OrderItemInput, OrderList, OrderWithItems,
            SellerOrderList, SellerOrderView, UpdateOrderStatusRequest,
        },
    },
    models::{CartItem, Customer, Meal, Order, OrderItem, OrderStatus, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, meals, orders, params},
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
        auth::login,
        auth::register,
        auth::me,
        auth::update_profile,
        meals::list_meals,
        meals::list_categories,
        meals::popular_meals,
        meals::get_meal,
        meals::create_meal,
        meals::update_meal,
        meals::delete_meal,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::my_orders,
        orders::seller_orders,
        orders::get_order,
        orders::update_order_status
    ),
    components(
        schemas(
            User,
            Meal,
            CartItem,
            Customer,
            Order,
            OrderItem,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CreateMealRequest,
            UpdateMealRequest,
            MealList,
            CategoryList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartList,
            CreateOrderRequest,
            CustomerInfo,
            OrderItemInput,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            SellerOrderView,
            SellerOrderList,
            params::Pagination,
            params::MealQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Meal>,
            ApiResponse<MealList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<SellerOrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Meals", description = "Meal catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

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
        admin::{CreateStaffRequest, UpdatePasswordRequest, UserList, UserSummary},
        auth::{
            AuthResponse, SendVerificationRequest, SendVerificationResponse, StaffLoginRequest,
            VerifyCodeRequest,
        },
        menu::{CreateMenuItemRequest, MenuList, UpdateMenuItemRequest},
        orders::{CreateOrderRequest, OrderItemInput, OrderList},
        users::ProfileWithOrders,
    },
    error::ErrorBody,
    models::{MenuCategory, MenuItem, Order, OrderItem, OrderStatus, Role, UserProfile},
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, menu, orders, params, staff, user},
    services::verification_service::DeliveryMode,
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
        auth::send_verification,
        auth::verify_code,
        auth::staff_login,
        user::profile,
        user::my_orders,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        staff::list_orders,
        staff::complete_order,
        menu::list_menu,
        menu::get_menu_item,
        menu::create_menu_item,
        menu::update_menu_item,
        menu::delete_menu_item,
        admin::list_users,
        admin::create_staff,
        admin::update_staff_password,
        admin::delete_staff
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            MenuCategory,
            DeliveryMode,
            UserProfile,
            Order,
            OrderItem,
            MenuItem,
            ErrorBody,
            SendVerificationRequest,
            SendVerificationResponse,
            VerifyCodeRequest,
            StaffLoginRequest,
            AuthResponse,
            CreateOrderRequest,
            OrderItemInput,
            OrderList,
            ProfileWithOrders,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            MenuList,
            CreateStaffRequest,
            UpdatePasswordRequest,
            UserSummary,
            UserList,
            params::OrderListQuery,
            params::MenuQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<MenuItem>,
            ApiResponse<MenuList>,
            ApiResponse<AuthResponse>,
            ApiResponse<UserList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Phone verification and staff login"),
        (name = "User", description = "Customer profile and history"),
        (name = "Orders", description = "Order placement and browsing"),
        (name = "Staff", description = "Order handling for staff"),
        (name = "Menu", description = "Menu endpoints"),
        (name = "Admin", description = "Staff account administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

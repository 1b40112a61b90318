//! OpenAPI document for the public API surface.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CT Studio API",
        description = "Catalog, checkout and back-office API for the CT Studio web agency."
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::checkout::create_checkout,
        crate::handlers::webhooks::stripe_webhook,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::orders::my_orders,
        crate::handlers::contact::submit_contact,
    ),
    components(schemas(
        crate::cart::CartItem,
        crate::services::checkout::CheckoutRequest,
        crate::services::checkout::CheckoutResponse,
        crate::auth::TokenResponse,
        crate::services::users::RegisterInput,
        crate::handlers::auth::LoginRequest,
        crate::handlers::contact::ContactRequest,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "products", description = "Public catalog"),
        (name = "checkout", description = "Stripe Checkout sessions"),
        (name = "webhooks", description = "Payment event delivery"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "orders", description = "Order history"),
        (name = "contact", description = "Contact form"),
    )
)]
pub struct ApiDoc;

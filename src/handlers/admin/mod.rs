//! Back-office surface. Every route in here sits behind the auth and
//! admin-role middleware layered on in the router assembly.

pub mod orders;
pub mod products;
pub mod stats;
pub mod upload;
pub mod users;

use crate::handlers::AppState;
use axum::Router;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", products::admin_product_routes())
        .nest("/users", users::admin_user_routes())
        .nest("/orders", orders::admin_order_routes())
        .nest("/stats", stats::admin_stats_routes())
        .nest("/upload", upload::admin_upload_routes())
}

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod common;
pub mod contact;
pub mod orders;
pub mod products;
pub mod webhooks;

use crate::{
    config::AppConfig,
    events::EventSender,
    mailer::ContactMailer,
    payments::StripeClient,
    services::{
        CheckoutService, OrderService, ProductService, ReconciliationService, UserService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
    pub users: Arc<UserService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub mailer: Option<Arc<ContactMailer>>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        stripe: Option<Arc<StripeClient>>,
        mailer: Option<Arc<ContactMailer>>,
        config: AppConfig,
    ) -> Self {
        let products = Arc::new(ProductService::new(db.clone(), event_sender.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            stripe,
            products.clone(),
            event_sender.clone(),
            config,
        ));
        let orders = Arc::new(OrderService::new(db.clone(), event_sender.clone()));
        let users = Arc::new(UserService::new(db.clone(), event_sender.clone()));
        let reconciliation = Arc::new(ReconciliationService::new(db, event_sender));

        Self {
            products,
            checkout,
            orders,
            users,
            reconciliation,
            mailer,
        }
    }
}

use crate::{
    cart::CartItem,
    config::AppConfig,
    entities::{order, order_item},
    errors::ServiceError,
    events::{Event, EventSender},
    payments::{CreateSessionParams, SessionLineItem, StripeClient},
    services::products::ProductService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Checkout orchestration: validate the cart, create a hosted payment
/// session, persist a pending order keyed by the session id.
///
/// The order insert is deliberately best-effort. Once the payment session
/// exists the buyer must get its URL; a failed insert is logged and the
/// session simply expires unreconciled if never completed.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    stripe: Option<Arc<StripeClient>>,
    products: Arc<ProductService>,
    event_sender: EventSender,
    config: AppConfig,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub customer_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub customer_email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub customer_phone: String,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        stripe: Option<Arc<StripeClient>>,
        products: Arc<ProductService>,
        event_sender: EventSender,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            stripe,
            products,
            event_sender,
            config,
        }
    }

    /// Run the checkout flow for a cart snapshot. `user_id` is present when
    /// the caller carried a valid session token; the order is then linked
    /// to their account.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_checkout(
        &self,
        request: CheckoutRequest,
        user_id: Option<Uuid>,
    ) -> Result<CheckoutResponse, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "No items in cart".to_string(),
            ));
        }
        request.validate()?;
        if request.items.iter().any(|i| i.quantity == 0) {
            return Err(ServiceError::ValidationError(
                "Item quantity must be at least 1".to_string(),
            ));
        }

        // Credentials are checked before any external call or side effect.
        let stripe = self.stripe.as_ref().ok_or_else(|| {
            ServiceError::InternalError("Stripe is not configured".to_string())
        })?;

        // Re-validate prices against the catalog where the item resolves to
        // a known product; ad-hoc items keep the client price.
        let mut priced_items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let price = match self.products.find_by_reference(&item.id).await? {
                Some(product) => product.price,
                None => item.price,
            };
            priced_items.push((item.clone(), price));
        }

        let total: Decimal = priced_items
            .iter()
            .map(|(item, price)| *price * Decimal::from(item.quantity))
            .sum();

        let session = stripe
            .create_checkout_session(CreateSessionParams {
                line_items: priced_items
                    .iter()
                    .map(|(item, price)| SessionLineItem {
                        name: item.name.clone(),
                        unit_price: *price,
                        quantity: item.quantity,
                    })
                    .collect(),
                customer_email: request.customer_email.clone(),
                success_url: self.config.success_url(),
                cancel_url: self.config.cancel_url(),
                metadata: vec![
                    ("total".to_string(), total.to_string()),
                    ("customer_name".to_string(), request.customer_name.clone()),
                    ("customer_phone".to_string(), request.customer_phone.clone()),
                ],
            })
            .await?;

        let url = session.url.clone().ok_or_else(|| {
            ServiceError::ExternalServiceError(
                "payment session has no redirect URL".to_string(),
            )
        })?;

        // Best-effort order persistence; see the module doc for why a
        // failure here must not fail the checkout.
        if let Err(e) = self
            .persist_pending_order(&session.id, &request, &priced_items, total, user_id)
            .await
        {
            warn!(session_id = %session.id, error = %e, "pending order persistence failed");
        }

        Ok(CheckoutResponse {
            session_id: session.id,
            url,
        })
    }

    async fn persist_pending_order(
        &self,
        session_id: &str,
        request: &CheckoutRequest,
        priced_items: &[(CartItem, Decimal)],
        total: Decimal,
        user_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            checkout_session_id: Set(session_id.to_string()),
            email: Set(request.customer_email.clone()),
            name: Set(Some(request.customer_name.clone())),
            phone: Set(Some(request.customer_phone.clone())),
            total: Set(total),
            status: Set(order::OrderStatus::Pending),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        };
        order.insert(&txn).await?;

        for (item, price) in priced_items {
            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_name: Set(item.name.clone()),
                quantity: Set(item.quantity as i32),
                price: Set(*price),
            };
            line.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;
        info!(order_id = %order_id, session_id = %session_id, "pending order created");
        Ok(())
    }
}

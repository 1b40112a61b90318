use crate::{
    entities::{order, Order},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Reconciliation of local order state with the payment processor's
/// outcome, driven by verified webhook events.
///
/// Both transitions are unconditional status assignments, which is what
/// makes redeliveries and concurrent deliveries safe without locking.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ReconciliationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// `checkout.session.completed`: mark the matching order paid.
    /// A missing order is a hard NotFound — the processor's retry policy
    /// decides whether the event comes back.
    #[instrument(skip(self))]
    pub async fn session_completed(&self, session_id: &str) -> Result<(), ServiceError> {
        let existing = Order::find()
            .filter(order::Column::CheckoutSessionId.eq(session_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order not found for session {}", session_id))
            })?;

        let order_id = existing.id;
        let mut model: order::ActiveModel = existing.into();
        model.status = Set(order::OrderStatus::Paid);
        model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderPaid(order_id))
            .await;
        info!(order_id = %order_id, session_id, "order marked paid");
        Ok(())
    }

    /// `checkout.session.expired`: best-effort cancellation. A missing
    /// order is logged and swallowed so the processor stops retrying a
    /// condition we cannot resolve.
    #[instrument(skip(self))]
    pub async fn session_expired(&self, session_id: &str) {
        match self.cancel_by_session(session_id).await {
            Ok(Some(order_id)) => {
                info!(order_id = %order_id, session_id, "order cancelled on session expiry")
            }
            Ok(None) => {
                warn!(session_id, "expired session has no matching order; ignoring")
            }
            Err(e) => warn!(session_id, error = %e, "failed to cancel order on expiry"),
        }
    }

    async fn cancel_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<uuid::Uuid>, ServiceError> {
        let Some(existing) = Order::find()
            .filter(order::Column::CheckoutSessionId.eq(session_id))
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let order_id = existing.id;
        let mut model: order::ActiveModel = existing.into();
        model.status = Set(order::OrderStatus::Cancelled);
        model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderCancelled(order_id))
            .await;
        Ok(Some(order_id))
    }
}

use crate::{
    entities::{order, order_item, Order, OrderItem, Product, User},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order queries and admin mutations. Buyers never mutate orders; their
/// only access is the read-only "my orders" listing.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

/// An order with its line items, as rendered in the back-office and the
/// profile page.
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_products: u64,
    pub total_users: u64,
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Serialize)]
pub struct RecentOrder {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub total: Decimal,
    pub status: order::OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// All orders, newest first, items included.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<OrderWithItems>, ServiceError> {
        let orders = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.attach_items(orders).await
    }

    /// Orders owned by one user, newest first, items included.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderWithItems>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.attach_items(orders).await
    }

    /// Admin status override. Any enum member is a legal target; operators
    /// use this to move orders through PROCESSING and COMPLETED.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: order::OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let old_status = existing.status;
        let mut model: order::ActiveModel = existing.into();
        model.status = Set(status);
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.as_str().to_string(),
                new_status: status.as_str().to_string(),
            })
            .await;
        Ok(updated)
    }

    /// Delete an order and, transactionally, its line items.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let txn = self.db.begin().await?;
        OrderItem::delete_many()
            .filter(order_item::Column::OrderId.eq(existing.id))
            .exec(&txn)
            .await?;
        Order::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Dashboard aggregates: row counts, revenue sum, five latest orders.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<AdminStats, ServiceError> {
        let total_products = Product::find().count(&*self.db).await?;
        let total_users = User::find().count(&*self.db).await?;
        let total_orders = Order::find().count(&*self.db).await?;

        let all_orders = Order::find().all(&*self.db).await?;
        let total_revenue = all_orders.iter().map(|o| o.total).sum();

        let recent_orders = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .limit(5)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|o| RecentOrder {
                id: o.id,
                email: o.email,
                name: o.name,
                total: o.total,
                status: o.status,
                created_at: o.created_at,
            })
            .collect();

        Ok(AdminStats {
            total_products,
            total_users,
            total_orders,
            total_revenue,
            recent_orders,
        })
    }

    async fn attach_items(
        &self,
        orders: Vec<order::Model>,
    ) -> Result<Vec<OrderWithItems>, ServiceError> {
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = OrderItem::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .all(&*self.db)
                .await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }
}

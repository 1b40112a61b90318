use crate::{
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Catalog management: the public product listing plus the admin CRUD
/// surface behind it.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

/// Input for creating a product. Update uses the same shape; the admin
/// dialog always submits the full record.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub price: Decimal,
    #[validate(length(min = 1, message = "Image is required"))]
    pub image_url: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
}

impl ProductInput {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        if self.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must be positive".to_string(),
            ));
        }
        if !self
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ServiceError::ValidationError(
                "Slug must be URL-safe (alphanumeric and dashes)".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Public catalog listing: popular packages first, then newest first.
    #[instrument(skip(self))]
    pub async fn list_public(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_desc(product::Column::Popular)
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Admin listing: newest first regardless of popularity.
    pub async fn list_admin(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Look up a product by catalog id or slug. Used by checkout to
    /// re-validate client-supplied prices.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<product::Model>, ServiceError> {
        if let Ok(id) = Uuid::parse_str(reference) {
            if let Some(found) = Product::find_by_id(id).one(&*self.db).await? {
                return Ok(Some(found));
            }
        }
        Product::find()
            .filter(product::Column::Slug.eq(reference))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.check()?;
        self.ensure_slug_free(&input.slug, None).await?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(input.slug),
            description: Set(input.description),
            price: Set(input.price),
            image_url: Set(input.image_url),
            features: Set(serde_json::json!(input.features)),
            popular: Set(input.popular),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        info!(product_id = %created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.check()?;
        self.ensure_slug_free(&input.slug, Some(id)).await?;

        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let mut model: product::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.slug = Set(input.slug);
        model.description = Set(input.description);
        model.price = Set(input.price);
        model.image_url = Set(input.image_url);
        model.features = Set(serde_json::json!(input.features));
        model.popular = Set(input.popular);
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Delete a catalog entry. Historical order items keep their
    /// denormalized product name and are untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        existing.delete(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let existing = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;
        match existing {
            Some(found) if Some(found.id) != exclude => Err(ServiceError::InvalidOperation(
                format!("Slug '{}' is already in use", slug),
            )),
            _ => Ok(()),
        }
    }
}

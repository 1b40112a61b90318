use crate::{
    auth::{hash_password, verify_password},
    entities::{user, User},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Account management: self-registration, credential checks, and the
/// admin user CRUD surface.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct RegisterInput {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
}

/// Admin create: registration shape plus an explicit role.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Admin update: every field optional; a supplied password is re-hashed.
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// User as exposed over the API; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: user::UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Self-registration always yields the USER role and never a token;
    /// the caller logs in separately.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<UserView, ServiceError> {
        input.validate()?;
        self.ensure_email_free(&input.email, None).await?;

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            name: Set(input.name),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(user::UserRole::User),
            created_at: Set(Utc::now()),
        };
        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        info!(user_id = %created.id, "user registered");
        Ok(created.into())
    }

    /// Credential check for login. Deliberately collapses "no such user"
    /// and "wrong password" into one error.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let invalid = || ServiceError::Unauthorized("invalid email or password".to_string());

        let found = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &found.password_hash)? {
            return Err(invalid());
        }
        Ok(found)
    }

    pub async fn list(&self) -> Result<Vec<UserView>, ServiceError> {
        Ok(User::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: CreateUserInput) -> Result<UserView, ServiceError> {
        input.validate()?;
        let role = parse_role(input.role.as_deref())?;
        self.ensure_email_free(&input.email, None).await?;

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            name: Set(input.name),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(role),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&*self.db).await?.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> Result<UserView, ServiceError> {
        let existing = User::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

        if let Some(email) = &input.email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let mut model: user::ActiveModel = existing.into();
        if let Some(email) = input.email {
            model.email = Set(email);
        }
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(password) = input.password {
            if password.len() < 6 {
                return Err(ServiceError::ValidationError(
                    "Password must be at least 6 characters".to_string(),
                ));
            }
            model.password_hash = Set(hash_password(&password)?);
        }
        if let Some(role) = input.role {
            model.role = Set(parse_role(Some(&role))?);
        }

        Ok(model.update(&*self.db).await?.into())
    }

    /// Delete a user. The acting admin cannot delete their own account;
    /// everything else is fair game.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, acting_admin: Uuid) -> Result<(), ServiceError> {
        if id == acting_admin {
            return Err(ServiceError::InvalidOperation(
                "You cannot delete your own account".to_string(),
            ));
        }

        let existing = User::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

        existing.delete(&*self.db).await?;
        self.event_sender.send_or_log(Event::UserDeleted(id)).await;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?;
        match existing {
            Some(found) if Some(found.id) != exclude => Err(ServiceError::ValidationError(
                "A user with this email already exists".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn parse_role(role: Option<&str>) -> Result<user::UserRole, ServiceError> {
    match role {
        None => Ok(user::UserRole::User),
        Some(value) => user::UserRole::parse(value).ok_or_else(|| {
            ServiceError::ValidationError(format!("Unknown role '{}'", value))
        }),
    }
}

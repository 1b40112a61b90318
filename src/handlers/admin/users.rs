use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::{
        common::{created_response, no_content_response, success_response},
        AppState,
    },
    services::users::{CreateUserInput, UpdateUserInput},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let users = state.services.users.list().await?;
    Ok(success_response(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.create(payload).await?;
    Ok(created_response(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.update(id, payload).await?;
    Ok(success_response(user))
}

/// Delete an account. The self-deletion guard lives in the service so it
/// holds for every caller.
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.users.delete(id, admin.user_id).await?;
    Ok(no_content_response())
}

pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", put(update_user).delete(delete_user))
}

use super::common::{success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    mailer::ContactMessage,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

/// Forward a contact-form submission to the service inbox.
#[utoipa::path(
    post,
    path = "/api/v1/contact",
    responses(
        (status = 200, description = "Message delivered"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 500, description = "Mail provider unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "contact"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let mailer = state.services.mailer.as_ref().ok_or_else(|| {
        ServiceError::InternalError("Mail delivery is not configured".to_string())
    })?;

    mailer
        .send_contact(&ContactMessage {
            subject: payload.subject,
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
        })
        .await?;

    Ok(success_response(json!({ "sent": true })))
}

pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/", post(submit_contact))
}

use crate::{
    errors::ServiceError,
    handlers::{common::created_response, AppState},
};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

/// Accept a multipart image upload and store it under the configured
/// upload directory. The stored name is timestamp-prefixed and reduced to
/// a safe character set, so client filenames can never escape the
/// directory or collide meaningfully.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("invalid multipart body: {}", e)))?
        .ok_or_else(|| ServiceError::ValidationError("no file field in upload".to_string()))?;

    let original_name = field.file_name().unwrap_or("file").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("failed to read upload: {}", e)))?;

    if data.is_empty() {
        return Err(ServiceError::ValidationError(
            "uploaded file is empty".to_string(),
        ));
    }

    let filename = format!("{}-{}", Utc::now().timestamp_millis(), sanitize(&original_name));
    let dir = std::path::Path::new(&state.config.upload_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ServiceError::InternalError(format!("upload dir unavailable: {}", e)))?;
    tokio::fs::write(dir.join(&filename), &data)
        .await
        .map_err(|e| ServiceError::InternalError(format!("failed to store upload: {}", e)))?;

    info!(%filename, size = data.len(), "file uploaded");
    Ok(created_response(json!({
        "url": format!("/uploads/{}", filename)
    })))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn admin_upload_routes() -> Router<AppState> {
    Router::new().route("/", post(upload_file))
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn filenames_are_reduced_to_safe_characters() {
        assert_eq!(sanitize("logo.png"), "logo.png");
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize("mein bild (1).jpg"), "mein_bild__1_.jpg");
    }
}

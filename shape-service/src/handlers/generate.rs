use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use service_core::error::AppError;
use std::path::{Path, PathBuf};

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Relay one uploaded image through the hosted shape-generation model
/// and stream the resulting GLB back as an attachment.
///
/// The staged copy of the upload is owned by a [`crate::services::StagedFile`]
/// guard, so it is removed whichever way this handler exits.
pub async fn generate_shape(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (filename, data) = read_image_field(&mut multipart).await?;

    let staged = state.staging.stage(&filename, data).await?;

    tracing::info!(
        staged = %staged.unique_name(),
        original = %filename,
        "Upload staged, invoking shape generation"
    );

    // Single synchronous invocation, no retry; the provider's failure
    // message is surfaced to the caller as-is.
    let result = state
        .provider
        .generate(staged.path())
        .await
        .map_err(|e| {
            tracing::error!(staged = %staged.unique_name(), error = %e, "Shape generation failed");
            AppError::InternalError(anyhow::Error::new(e))
        })?;

    let asset_path = extract_asset_path(&result).ok_or_else(|| {
        tracing::error!(staged = %staged.unique_name(), "Malformed generation result");
        AppError::InternalError(anyhow::anyhow!("Unexpected response format from model"))
    })?;

    // The Space can report success before the asset is readable.
    if !asset_path.exists() {
        tracing::error!(
            staged = %staged.unique_name(),
            asset = %asset_path.display(),
            "Generated asset missing on disk"
        );
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Model generation failed"
        )));
    }

    let asset = tokio::fs::read(&asset_path).await.map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to read generated asset: {}", e))
    })?;

    let download_name = format!("model_{}.glb", staged.download_stem());

    tracing::info!(
        staged = %staged.unique_name(),
        download = %download_name,
        size = asset.len(),
        "Shape generation completed"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "model/gltf-binary".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
        ],
        asset,
    )
        .into_response())
}

/// Locate the image field and validate it before any side effect occurs.
/// Rejections here leave no trace on disk.
async fn read_image_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("No selected file")));
        }
        if !allowed_file(&filename) {
            return Err(AppError::BadRequest(anyhow::anyhow!("Invalid file type")));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
            })?
            .to_vec();

        return Ok((filename, data));
    }

    Err(AppError::BadRequest(anyhow::anyhow!(
        "No image part in the request"
    )))
}

fn allowed_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pull the generated asset's path out of the untrusted result. Expects
/// an ordered sequence of at least two elements whose first element is a
/// mapping with a string under `value`; anything else is a protocol
/// violation and yields `None`.
fn extract_asset_path(result: &Value) -> Option<PathBuf> {
    let items = result.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let path = items.first()?.as_object()?.get("value")?.as_str()?;
    Some(PathBuf::from(path))
}

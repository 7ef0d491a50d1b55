//! Shape-generation provider abstraction.
//!
//! The hosted model is treated as an opaque capability: one image in, one
//! untyped JSON result out. Implementations must not retry; a single
//! failure surfaces to the caller as-is.

pub mod hunyuan;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The capability answered with an error of its own.
    #[error("{0}")]
    ApiError(String),

    /// The capability could not be reached.
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// A hosted image-to-3D generation capability.
///
/// The result is returned unparsed; callers are responsible for
/// validating its shape before extracting anything from it.
#[async_trait]
pub trait ShapeProvider: Send + Sync {
    /// Invoke shape generation exactly once for the staged image.
    async fn generate(&self, image_path: &Path) -> Result<Value, ProviderError>;
}

//! Mock provider implementation for testing.

use super::{ProviderError, ShapeProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One observed invocation: the staged path handed to the provider and
/// whether that path existed at call time.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub image_path: PathBuf,
    pub input_existed: bool,
}

/// Scriptable stand-in for the hosted capability. Returns a canned
/// result or error and records every invocation.
pub struct MockShapeProvider {
    result: Result<Value, ProviderError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockShapeProvider {
    pub fn returning(result: Value) -> Self {
        Self {
            result: Ok(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShapeProvider for MockShapeProvider {
    async fn generate(&self, image_path: &Path) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            image_path: image_path.to_path_buf(),
            input_existed: image_path.exists(),
        });

        self.result.clone()
    }
}

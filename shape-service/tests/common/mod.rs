use reqwest::multipart;
use shape_service::config::ShapeConfig;
use shape_service::services::ShapeProvider;
use shape_service::startup::Application;
use std::sync::Arc;
use uuid::Uuid;

// Smallest valid-looking payload; the service never inspects pixel data.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub struct TestApp {
    pub address: String,
    pub uploads_dir: String,
}

impl TestApp {
    pub async fn spawn(provider: Arc<dyn ShapeProvider>) -> Self {
        let uploads_dir = format!("target/test-uploads-{}", Uuid::new_v4());

        let mut config = ShapeConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.uploads.dir = uploads_dir.clone();

        let app = Application::build(config, provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            uploads_dir,
        }
    }

    /// Number of files currently staged.
    pub fn staged_count(&self) -> usize {
        match std::fs::read_dir(&self.uploads_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.uploads_dir).await;
    }
}

/// Multipart form with a single file part under the given field name.
pub fn image_form(field_name: &str, file_name: &str) -> multipart::Form {
    multipart::Form::new().part(
        field_name.to_string(),
        multipart::Part::bytes(PNG_BYTES.to_vec())
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .unwrap(),
    )
}

/// Write a stand-in generated asset to a unique path and return the path.
pub fn write_fake_asset(contents: &[u8]) -> std::path::PathBuf {
    let dir = std::path::Path::new("target");
    std::fs::create_dir_all(dir).expect("Failed to create asset dir");
    let path = dir.join(format!("test-asset-{}.glb", Uuid::new_v4()));
    std::fs::write(&path, contents).expect("Failed to write fake asset");
    path
}

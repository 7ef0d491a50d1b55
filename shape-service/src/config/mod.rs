use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default hosted Space serving the shape-generation model.
const DEFAULT_SPACE_URL: &str = "https://tencent-hunyuan3d-2.hf.space";

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub uploads: UploadSettings,
    pub hunyuan: HunyuanSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Directory holding staged uploads; created at startup if absent.
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HunyuanSettings {
    pub space_url: String,
    /// Optional Hugging Face token, sent as a bearer header when present.
    pub hf_token: Option<String>,
}

impl ShapeConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config handles .env and the APP__ prefix.
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ShapeConfig {
            common: common_config,
            uploads: UploadSettings {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
            },
            hunyuan: HunyuanSettings {
                space_url: get_env("HUNYUAN_SPACE_URL", Some(DEFAULT_SPACE_URL), is_prod)?,
                hf_token: env::var("HF_TOKEN").ok(),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

pub mod providers;
pub mod staging;

pub use providers::{ProviderError, ShapeProvider};
pub use staging::{StagedFile, UploadStaging};

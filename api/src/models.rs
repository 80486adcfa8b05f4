use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for a successful photo upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadPhotoResponse {
    pub message: String,
    /// Size of the uploaded payload in bytes
    pub size: usize,
}

/// Response for viewing a photo
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewPhotoResponse {
    pub image_url: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub decision_engine: String,
}

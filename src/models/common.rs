use serde::{Deserialize, Serialize};

/// A `/v1/models` record. Only the fields the image client filters on are
/// typed; chat and embedding models omit `max_images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub max_images: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ModelListResponse {
    #[serde(default)]
    pub data: Vec<ModelRecord>,
}

/// Error bodies seen from image backends: `{"error": "..."}`,
/// `{"error": {"message": "..."}}` or a bare `{"message": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    Flat { error: String },
    Nested { error: ApiErrorDetail },
    Message { message: String },
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

impl ApiErrorBody {
    pub fn into_message(self) -> String {
        match self {
            ApiErrorBody::Flat { error } => error,
            ApiErrorBody::Nested { error } => error.message,
            ApiErrorBody::Message { message } => message,
        }
    }
}

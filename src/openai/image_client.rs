use crate::{
    error::{Error, Result},
    models::{
        ApiErrorBody, ImageGenerationRequest, ImageGenerationResponse, ImageModel,
        ModelListResponse, ImageSize,
    },
};
use reqwest::{Client, Response, StatusCode};

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ImageClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Image-capable models advertised by `/v1/models`. Failures are logged
    /// and reported as an empty list.
    pub async fn list_image_models(&self) -> Vec<ImageModel> {
        match self.fetch_models().await {
            Ok(models) => {
                log::debug!("Found {} image models", models.len());
                models
            }
            Err(e) => {
                log::error!("Error fetching image models: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<ImageModel>> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self.authorized(self.client.get(&url)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }

        let list: ModelListResponse = response
            .json()
            .await
            .map_err(|e| Error::Response(e.to_string()))?;

        Ok(list
            .data
            .into_iter()
            .filter_map(|record| match record.max_images {
                Some(max_images) if max_images > 0 && !record.id.is_empty() => Some(ImageModel {
                    id: record.id,
                    max_images,
                }),
                _ => None,
            })
            .collect())
    }

    /// Submits a generation request and hands back the raw response; the
    /// caller decides what a non-success status means.
    pub async fn generate_images(
        &self,
        model: &str,
        prompt: &str,
        count: u32,
        size: ImageSize,
    ) -> Result<Response> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let payload = ImageGenerationRequest::new(model, prompt, count, size);

        log::info!("Generating {} image(s) with model: {}", payload.n, model);
        log::debug!("Image generation request payload: {:?}", payload);

        let response = self
            .authorized(self.client.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Image generation request failed: {}", e)))?;

        Ok(response)
    }
}

/// URLs from a successful `/v1/images/generations` body.
pub fn parse_generation(body: &str) -> Result<Vec<String>> {
    let parsed: ImageGenerationResponse =
        serde_json::from_str(body).map_err(|e| Error::Response(e.to_string()))?;
    Ok(parsed.data.into_iter().map(|image| image.url).collect())
}

/// Collapses the error body shapes image backends return into one message.
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.into_message();
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

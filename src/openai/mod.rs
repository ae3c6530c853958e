pub mod image_client;
pub mod translation_client;

use crate::{
    config::ApiConfig,
    error::{Error, Result},
};
use reqwest::Client;

pub use image_client::{api_error_message, parse_generation, ImageClient};
pub use translation_client::{is_english, TranslationClient};

#[derive(Clone)]
pub struct ApiClient {
    image_client: ImageClient,
    translation_client: TranslationClient,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("OPEN_AI_BASE is required".into()))?;
        let translate_url = config
            .chat_completions_url()
            .ok_or_else(|| Error::Config("No chat-completion URL for translation".into()))?;

        if config.api_key.is_none() {
            log::warn!("No API key configured, requests will be sent unauthenticated");
        }

        let client = Client::new();

        Ok(Self {
            image_client: ImageClient::new(client.clone(), base_url, config.api_key.clone()),
            translation_client: TranslationClient::new(
                client,
                &translate_url,
                config.api_key.clone(),
                &config.translate_model,
                config.translate_max_tokens,
            ),
        })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn translator(&self) -> &TranslationClient {
        &self.translation_client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_base_url() {
        assert!(matches!(ApiClient::new(&ApiConfig::new()), Err(Error::Config(_))));
        assert!(ApiClient::new(&ApiConfig::new().with_base_url("http://localhost:9")).is_ok());
    }
}

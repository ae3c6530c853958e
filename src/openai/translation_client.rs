use crate::{
    error::{Error, Result},
    models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage},
};
use reqwest::Client;
use std::collections::HashMap;

const TRANSLATE_INSTRUCTION: &str =
    "translate below text to English, and reply the translated text only:";

/// True when every character is an ASCII letter, whitespace or one of
/// `. , ! ?`. The empty prompt counts as English.
pub fn is_english(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?'))
}

#[derive(Clone)]
pub struct TranslationClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl TranslationClient {
    pub fn new(
        client: Client,
        url: &str,
        api_key: Option<String>,
        model: &str,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            url: url.to_string(),
            api_key,
            model: model.to_string(),
            max_tokens,
        }
    }

    /// Translates `text` to English. Every failure is logged and yields
    /// `None` so callers can fall back to the untranslated prompt.
    pub async fn translate(&self, text: &str) -> Option<String> {
        match self.request_translation(text).await {
            Ok(translated) => {
                log::debug!("Translated prompt: {}", translated);
                Some(translated)
            }
            Err(e) => {
                log::warn!("Prompt translation failed: {}", e);
                None
            }
        }
    }

    fn build_payload(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!("{} {}", TRANSLATE_INSTRUCTION, text),
                name: "prompt".to_string(),
            }],
            temperature: 0.5,
            top_p: 1.0,
            stream: false,
            max_tokens: self.max_tokens,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            logit_bias: HashMap::new(),
        }
    }

    async fn request_translation(&self, text: &str) -> Result<String> {
        let mut request = self.client.post(&self.url).json(&self.build_payload(text));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        log::info!("Translating prompt with model: {}", self.model);

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: super::api_error_message(status, &body),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Response(e.to_string()))?;

        completion
            .first_content()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::Response("No translation in completion".into()))
    }
}

//! UI state and the translate → generate → persist cycle.
//!
//! The controller is front-end agnostic: a renderer reads [`UiState`] and
//! forwards user events to the setter methods and [`Controller::submit`].

use crate::{
    error::{Error, Result},
    models::{strip_query, ImageModel, ImageSize},
    openai::{api_error_message, is_english, parse_generation, ApiClient},
    storage::LinkRepository,
    validator::LinkValidator,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "sdxl";
pub const DEFAULT_QUANTITY: u32 = 5;
const CANCELLED: &str = "Generation was cancelled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Translating,
    Generating,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Submit { english: bool },
    TranslationDone,
    GenerationSucceeded,
    GenerationFailed(String),
}

impl Phase {
    pub fn transition(self, event: Transition) -> Phase {
        match (self, event) {
            (Phase::Idle | Phase::Error(_), Transition::Submit { english: false }) => {
                Phase::Translating
            }
            (Phase::Idle | Phase::Error(_), Transition::Submit { english: true }) => {
                Phase::Generating
            }
            (Phase::Translating, Transition::TranslationDone) => Phase::Generating,
            (Phase::Generating, Transition::GenerationSucceeded) => Phase::Idle,
            (Phase::Generating, Transition::GenerationFailed(message)) => Phase::Error(message),
            (phase, event) => {
                log::warn!("Ignoring {:?} while {:?}", event, phase);
                phase
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Translating | Phase::Generating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub prompt: String,
    pub model: String,
    pub quantity: u32,
    pub max_quantity: u32,
    pub size: ImageSize,
    pub phase: Phase,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: DEFAULT_MODEL.to_string(),
            quantity: DEFAULT_QUANTITY,
            max_quantity: DEFAULT_QUANTITY,
            size: ImageSize::default(),
            phase: Phase::Idle,
        }
    }
}

/// Marks a submit cycle as running until it is dropped, including when the
/// submit future is cancelled mid-await.
struct CycleGuard(Arc<AtomicBool>);

impl CycleGuard {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        CycleGuard(flag.clone())
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Controller {
    api: ApiClient,
    links: LinkRepository,
    validator: LinkValidator,
    models: Vec<ImageModel>,
    state: UiState,
    in_flight: Arc<AtomicBool>,
}

impl Controller {
    pub fn new(api: ApiClient, links: LinkRepository, validator: LinkValidator) -> Self {
        Self {
            api,
            links,
            validator,
            models: Vec::new(),
            state: UiState::default(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn models(&self) -> &[ImageModel] {
        &self.models
    }

    /// True only while a submit cycle is actually running. A loading phase
    /// left behind by a cancelled submit does not count.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) && self.state.phase.is_loading()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state.phase {
            Phase::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Refreshes the model selector. An unreachable API leaves it empty.
    /// When the current model is listed, its limit is applied.
    pub async fn load_models(&mut self) -> &[ImageModel] {
        self.models = self.api.image().list_image_models().await;
        let current = self.state.model.clone();
        if self.models.iter().any(|m| m.id == current) {
            self.select_model(&current);
        }
        &self.models
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.state.prompt = prompt.into();
    }

    pub fn set_size(&mut self, size: ImageSize) {
        self.state.size = size;
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.state.quantity = quantity.clamp(1, self.state.max_quantity.max(1));
    }

    /// Switches model and adopts its image limit, lowering the quantity if
    /// it no longer fits. The quantity is never raised.
    pub fn select_model(&mut self, id: &str) {
        self.state.model = id.to_string();
        match self.models.iter().find(|m| m.id == id) {
            Some(model) => {
                self.state.max_quantity = model.max_images;
                self.state.quantity = self.state.quantity.min(model.max_images);
            }
            None => log::debug!("Model {} not in the fetched list, keeping limits", id),
        }
    }

    fn apply(&mut self, event: Transition) {
        let phase = std::mem::replace(&mut self.state.phase, Phase::Idle);
        self.state.phase = phase.transition(event);
    }

    /// Runs one generation cycle and returns the stored links it produced.
    /// Failures surface through [`Phase::Error`]; only storage errors and a
    /// submit while busy are returned as `Err`.
    ///
    /// Dropping the returned future abandons the cycle and the next submit
    /// starts over.
    pub async fn submit(&mut self) -> Result<Vec<String>> {
        if self.is_loading() {
            return Err(Error::Busy);
        }
        if self.state.phase.is_loading() {
            log::warn!("Previous generation was cancelled while {:?}", self.state.phase);
            self.state.phase = Phase::Error(CANCELLED.to_string());
        }
        let _cycle = CycleGuard::start(&self.in_flight);

        let english = is_english(&self.state.prompt);
        self.apply(Transition::Submit { english });

        if !english {
            if let Some(translated) = self.api.translator().translate(&self.state.prompt).await {
                self.state.prompt = translated;
            }
            self.apply(Transition::TranslationDone);
        }

        match self.generate().await {
            Ok(urls) => match self.links.prepend(&urls).await {
                Ok(_) => {
                    log::info!("Stored {} new image link(s)", urls.len());
                    self.apply(Transition::GenerationSucceeded);
                    Ok(urls)
                }
                Err(e) => {
                    self.apply(Transition::GenerationFailed(e.to_string()));
                    Err(e)
                }
            },
            Err(e) => {
                let message = match e {
                    Error::Api { message, .. } => message,
                    other => other.to_string(),
                };
                log::error!("Image generation failed: {}", message);
                self.apply(Transition::GenerationFailed(message));
                Ok(Vec::new())
            }
        }
    }

    async fn generate(&self) -> Result<Vec<String>> {
        let state = &self.state;
        let response = self
            .api
            .image()
            .generate_images(&state.model, &state.prompt, state.quantity, state.size)
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Response(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }

        Ok(parse_generation(&body)?
            .iter()
            .map(|url| strip_query(url))
            .collect())
    }

    /// Persisted links that still load. Available in every phase.
    pub async fn gallery(&self) -> Result<Vec<String>> {
        self.validator.get_valid_image_links(&self.links).await
    }
}

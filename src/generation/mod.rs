//! # Generation Client
//!
//! Produces backstories, page text and room catalogs. Requests go to a
//! [`GenerationBackend`] (normally the HTTP chat-completions backend) paced by
//! a [`RateLimiter`]; whenever the backend cannot be used the deterministic
//! [`OfflineGenerator`] answers instead. Callers always get content back:
//! backend failures are logged and absorbed here.
//!
//! ## Modes
//!
//! The client moves through [`GenerationMode`] monotonically:
//!
//! - `Normal` - calls go to the backend.
//! - `Offline` - selected at startup (mock data, debug, or no backend).
//! - `SessionFallback` - a call failed transiently; offline until restart.
//! - `PermanentFallback` - the backend throttled us; the flag is persisted in
//!   the store so later sessions start offline too.
//!
//! A failing call is answered from the offline generator in the same call.

pub mod catalog;
pub mod offline;
#[cfg(feature = "http-backend")]
pub mod openai;
pub mod rate_limit;
pub mod request;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::Config;
use crate::library::errors::LibraryError;
use crate::library::storage::{ContentStore, FallbackFlag};
use crate::library::types::Coordinate;
use crate::logutil::preview;

pub use catalog::extract_catalog;
pub use offline::OfflineGenerator;
pub use rate_limit::RateLimiter;
pub use request::{GenerationRequest, RequestKind};

/// Failures reported by a backend. None of them leave the client.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend is throttling requests")]
    Throttled,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("backend not configured: {0}")]
    NotConfigured(String),
}

/// A source of generated text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, BackendError>;

    /// Short name used in log lines.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum GenerationMode {
    Normal = 0,
    Offline = 1,
    SessionFallback = 2,
    PermanentFallback = 3,
}

impl GenerationMode {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => GenerationMode::Normal,
            1 => GenerationMode::Offline,
            2 => GenerationMode::SessionFallback,
            _ => GenerationMode::PermanentFallback,
        }
    }

    pub fn uses_backend(self) -> bool {
        self == GenerationMode::Normal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Normal => "normal",
            GenerationMode::Offline => "offline",
            GenerationMode::SessionFallback => "session fallback",
            GenerationMode::PermanentFallback => "permanent fallback",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct GenerationClient {
    backend: Option<Arc<dyn GenerationBackend>>,
    offline: OfflineGenerator,
    limiter: RateLimiter,
    mode: AtomicU8,
    store: Option<Arc<ContentStore>>,
    words_per_page: u32,
}

impl GenerationClient {
    /// Client in `Normal` mode calling `backend` at most once per `min_interval`.
    pub fn new(backend: Arc<dyn GenerationBackend>, min_interval: Duration) -> Self {
        Self {
            backend: Some(backend),
            offline: OfflineGenerator::new(),
            limiter: RateLimiter::new(min_interval),
            mode: AtomicU8::new(GenerationMode::Normal as u8),
            store: None,
            words_per_page: 500,
        }
    }

    /// Client that only ever answers from the offline generator.
    pub fn offline() -> Self {
        Self {
            backend: None,
            offline: OfflineGenerator::new(),
            limiter: RateLimiter::new(Duration::ZERO),
            mode: AtomicU8::new(GenerationMode::Offline as u8),
            store: None,
            words_per_page: 500,
        }
    }

    /// Persist permanent fallback in `store`, and honour a flag already there.
    pub fn with_store(mut self, store: Arc<ContentStore>) -> Result<Self, LibraryError> {
        if store.get::<FallbackFlag>(&())?.unwrap_or(false) {
            info!("Persisted fallback flag found, using offline content");
            self.mode
                .fetch_max(GenerationMode::PermanentFallback as u8, Ordering::SeqCst);
        }
        self.store = Some(store);
        Ok(self)
    }

    pub fn with_words_per_page(mut self, words_per_page: u32) -> Self {
        self.words_per_page = words_per_page;
        self
    }

    /// Select the backend the way the application starts up.
    ///
    /// Mock data or debug mode select the offline generator outright; a
    /// missing API key does too, with a warning.
    pub fn from_config(config: &Config, store: Arc<ContentStore>) -> Result<Self, LibraryError> {
        let settings = &config.generation;
        let client = if settings.use_mock_data || settings.debug {
            info!(
                "Using offline content (use_mock_data={}, debug={})",
                settings.use_mock_data, settings.debug
            );
            Self::offline()
        } else {
            match build_backend(config) {
                Ok(backend) => {
                    info!("Generation backend: {} ({})", backend.name(), settings.model);
                    Self::new(backend, settings.min_call_interval())
                }
                Err(e) => {
                    warn!("Generation backend unavailable, using offline content: {}", e);
                    Self::offline()
                }
            }
        };
        client
            .with_words_per_page(config.library.words_per_page)
            .with_store(store)
    }

    pub fn mode(&self) -> GenerationMode {
        GenerationMode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    pub fn backend_name(&self) -> &str {
        match (&self.backend, self.mode().uses_backend()) {
            (Some(backend), true) => backend.name(),
            _ => "offline",
        }
    }

    pub async fn generate_story(&self, name: &str, description: &str) -> String {
        let request = GenerationRequest::Story {
            name: name.to_string(),
            description: description.to_string(),
        };
        match self.call_backend(&request).await {
            Some(text) => text,
            None => self.offline.story(name, description),
        }
    }

    pub async fn generate_page(&self, title: &str, page: u32) -> String {
        let request = GenerationRequest::Page {
            title: title.to_string(),
            page,
            words_per_page: self.words_per_page,
        };
        match self.call_backend(&request).await {
            Some(text) => text,
            None => self.offline.page(title, page),
        }
    }

    /// Up to `count` titles for the room, or `None` when the backend's answer
    /// held no recognisable list.
    pub async fn generate_catalog(&self, coordinate: Coordinate, count: usize) -> Option<Vec<String>> {
        let request = GenerationRequest::Catalog { coordinate, count };
        match self.call_backend(&request).await {
            Some(text) => {
                let titles = extract_catalog(&text, count);
                if titles.is_none() {
                    warn!(
                        "Catalog response for room {} held no titles: {}",
                        coordinate,
                        preview(&text, 80)
                    );
                }
                titles
            }
            None => Some(self.offline.catalog(coordinate, count)),
        }
    }

    /// One paced backend attempt; `None` means answer offline.
    async fn call_backend(&self, request: &GenerationRequest) -> Option<String> {
        let backend = self.backend.as_ref()?;
        if !self.mode().uses_backend() {
            return None;
        }
        self.limiter.wait_turn().await;
        // another caller may have failed while this one was queued
        if !self.mode().uses_backend() {
            return None;
        }
        match backend.complete(request).await {
            Ok(text) => {
                debug!(
                    "{} {} response: {}",
                    backend.name(),
                    request.kind(),
                    preview(&text, 60)
                );
                Some(text)
            }
            Err(err) => {
                self.escalate(request.kind(), &err);
                None
            }
        }
    }

    fn escalate(&self, kind: RequestKind, err: &BackendError) {
        match err {
            BackendError::Throttled => {
                let previous = self
                    .mode
                    .fetch_max(GenerationMode::PermanentFallback as u8, Ordering::SeqCst);
                warn!(
                    "Backend throttled the {} request, switching to offline content permanently",
                    kind
                );
                if previous != GenerationMode::PermanentFallback as u8 {
                    self.persist_fallback();
                }
            }
            other => {
                self.mode
                    .fetch_max(GenerationMode::SessionFallback as u8, Ordering::SeqCst);
                warn!(
                    "{} request failed, using offline content for this session: {}",
                    kind,
                    preview(&other.to_string(), 120)
                );
            }
        }
    }

    fn persist_fallback(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.put::<FallbackFlag>(&(), &true) {
                warn!("Failed to persist fallback flag: {}", e);
            }
        }
    }
}

#[cfg(feature = "http-backend")]
fn build_backend(config: &Config) -> Result<Arc<dyn GenerationBackend>, BackendError> {
    let backend = openai::OpenAiBackend::from_config(&config.generation)?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "http-backend"))]
fn build_backend(_config: &Config) -> Result<Arc<dyn GenerationBackend>, BackendError> {
    Err(BackendError::NotConfigured(
        "built without the http-backend feature".to_string(),
    ))
}

//! # Configuration Management Module
//!
//! Typed configuration for the library: grid and shelf layout, the generation
//! backend, storage location and logging. The value is loaded once at startup
//! and handed explicitly to each component; nothing reads configuration from
//! global state.
//!
//! ## Configuration Structure
//!
//! - [`LibraryConfig`] - grid bounds, catalog size and shelf layout
//! - [`GenerationConfig`] - backend endpoint, model, pacing and mock-mode switches
//! - [`StorageConfig`] - location of the sled database
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use babelshelf::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Write a starter file, then load and validate it
//!     Config::create_default("babelshelf.toml").await?;
//!     let config = Config::load("babelshelf.toml").await?;
//!     println!("Grid: {}x{}", config.library.width, config.library.height);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [library]
//! width = 256
//! height = 256
//! books_per_room = 100
//! words_per_page = 500
//!
//! [generation]
//! model = "gpt-3.5-turbo"
//! min_call_interval_ms = 1000
//! use_mock_data = false
//! debug = false
//!
//! [storage]
//! data_dir = "./data/library"
//!
//! [logging]
//! level = "info"
//! ```

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::library::geometry::ShelfLayout;
use crate::library::types::LibrarySize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_grid_side")]
    pub width: u32,
    #[serde(default = "default_grid_side")]
    pub height: u32,
    #[serde(default = "default_books_per_room")]
    pub books_per_room: usize,
    /// Target length hint passed into page prompts.
    #[serde(default = "default_words_per_page")]
    pub words_per_page: u32,
    #[serde(default = "default_aisles_per_room")]
    pub aisles_per_room: u32,
    #[serde(default = "default_books_per_aisle")]
    pub books_per_aisle: u32,
    /// Books stacked on one shelf level before the next level starts.
    #[serde(default = "default_books_per_shelf")]
    pub books_per_shelf: u32,
    #[serde(default = "default_room_width")]
    pub room_width: f32,
    #[serde(default = "default_shelf_spacing")]
    pub shelf_spacing: f32,
    #[serde(default = "default_book_height")]
    pub book_height: f32,
}

fn default_grid_side() -> u32 {
    256
}

fn default_books_per_room() -> usize {
    100
}

fn default_words_per_page() -> u32 {
    500
}

fn default_aisles_per_room() -> u32 {
    5
}

fn default_books_per_aisle() -> u32 {
    20
}

fn default_books_per_shelf() -> u32 {
    4
}

fn default_room_width() -> f32 {
    800.0
}

fn default_shelf_spacing() -> f32 {
    120.0
}

fn default_book_height() -> f32 {
    40.0
}

impl LibraryConfig {
    pub fn size(&self) -> LibrarySize {
        LibrarySize::new(self.width, self.height)
    }

    pub fn shelf_layout(&self) -> ShelfLayout {
        ShelfLayout {
            aisles_per_room: self.aisles_per_room,
            books_per_aisle: self.books_per_aisle,
            books_per_shelf: self.books_per_shelf,
            room_width: self.room_width,
            shelf_spacing: self.shelf_spacing,
            book_height: self.book_height,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            width: default_grid_side(),
            height: default_grid_side(),
            books_per_room: default_books_per_room(),
            words_per_page: default_words_per_page(),
            aisles_per_room: default_aisles_per_room(),
            books_per_aisle: default_books_per_aisle(),
            books_per_shelf: default_books_per_shelf(),
            room_width: default_room_width(),
            shelf_spacing: default_shelf_spacing(),
            book_height: default_book_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat-completions endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; when unset the variable named by `api_key_env` is consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Minimum gap between the starts of two backend calls (ms).
    #[serde(default = "default_min_call_interval_ms")]
    pub min_call_interval_ms: u64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Always answer from the offline generator.
    #[serde(default)]
    pub use_mock_data: bool,
    /// Development mode; auto-selects the offline generator at startup.
    #[serde(default)]
    pub debug: bool,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_min_call_interval_ms() -> u64 {
    1000
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_system_prompt() -> String {
    "You are a creative assistant generating content for a game called Library of Babel."
        .to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl GenerationConfig {
    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }

    /// Configured key, else the environment variable, ignoring blank values.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            min_call_interval_ms: default_min_call_interval_ms(),
            timeout_seconds: default_timeout_seconds(),
            use_mock_data: false,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject values the core cannot operate with.
    pub fn validate(&self) -> Result<()> {
        let lib = &self.library;
        if lib.width == 0 || lib.height == 0 {
            return Err(anyhow!(
                "library grid must be at least 1x1 (got {}x{})",
                lib.width,
                lib.height
            ));
        }
        if lib.books_per_room == 0 {
            return Err(anyhow!("books_per_room must be greater than zero"));
        }
        if lib.books_per_shelf == 0 || lib.aisles_per_room == 0 {
            return Err(anyhow!(
                "aisles_per_room and books_per_shelf must be greater than zero"
            ));
        }
        let capacity = lib.shelf_layout().capacity();
        if lib.books_per_room > capacity {
            return Err(anyhow!(
                "books_per_room ({}) does not fit the shelf layout ({} aisles x {} books)",
                lib.books_per_room,
                lib.aisles_per_room,
                lib.books_per_aisle
            ));
        }
        let temperature = self.generation.temperature;
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(anyhow!("temperature must be a non-negative number"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            library: LibraryConfig::default(),
            generation: GenerationConfig::default(),
            storage: StorageConfig {
                data_dir: "./data/library".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("babelshelf.log".to_string()),
            },
        }
    }
}

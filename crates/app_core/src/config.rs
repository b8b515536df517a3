//! Application configuration

use crate::command::Command;
use crate::error::AppError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub gallery: GalleryConfig,
    pub slideshow: SlideshowConfig,
    pub sync: SyncConfig,
    pub gestures: GestureConfig,
    pub log: LogConfig,
    pub keybindings: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            gallery: GalleryConfig::default(),
            slideshow: SlideshowConfig::default(),
            sync: SyncConfig::default(),
            gestures: GestureConfig::default(),
            log: LogConfig::default(),
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base URL of the gallery backend
    pub server_url: String,
    /// Folder opened at startup, "" is the root
    pub start_folder: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            start_folder: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub thumbnail_size: ThumbnailSize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: ThumbnailSize::Medium,
        }
    }
}

/// Thumbnail size presets, stored as the slider position 1-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ThumbnailSize {
    Tiny,
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl ThumbnailSize {
    /// Size hint passed to the folder listing
    pub fn pixels(self) -> u32 {
        match self {
            ThumbnailSize::Tiny => 80,
            ThumbnailSize::Small => 120,
            ThumbnailSize::Medium => 180,
            ThumbnailSize::Large => 280,
            ThumbnailSize::ExtraLarge => 400,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThumbnailSize::Tiny => "Tiny",
            ThumbnailSize::Small => "Small",
            ThumbnailSize::Medium => "Medium",
            ThumbnailSize::Large => "Large",
            ThumbnailSize::ExtraLarge => "Extra Large",
        }
    }
}

impl TryFrom<u8> for ThumbnailSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ThumbnailSize::Tiny),
            2 => Ok(ThumbnailSize::Small),
            3 => Ok(ThumbnailSize::Medium),
            4 => Ok(ThumbnailSize::Large),
            5 => Ok(ThumbnailSize::ExtraLarge),
            other => Err(format!("thumbnail size must be 1-5, got {}", other)),
        }
    }
}

impl From<ThumbnailSize> for u8 {
    fn from(size: ThumbnailSize) -> Self {
        match size {
            ThumbnailSize::Tiny => 1,
            ThumbnailSize::Small => 2,
            ThumbnailSize::Medium => 3,
            ThumbnailSize::Large => 4,
            ThumbnailSize::ExtraLarge => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowConfig {
    pub interval_secs: u32,
    pub min_interval_secs: u32,
    pub max_interval_secs: u32,
    /// Random playback order
    pub shuffle: bool,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            min_interval_secs: 1,
            max_interval_secs: 30,
            shuffle: false,
        }
    }
}

impl SlideshowConfig {
    /// Clamp a requested interval into the configured range
    pub fn clamp_interval(&self, secs: u32) -> u32 {
        let min = self.min_interval_secs.max(1);
        let max = self.max_interval_secs.max(min);
        secs.clamp(min, max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 30,
        }
    }
}

/// Touch gesture thresholds in CSS pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Movement past this suppresses page scrolling
    pub scroll_lock_px: f64,
    /// Total movement below this is a tap
    pub tap_max_px: f64,
    pub min_swipe_px: f64,
    pub max_vertical_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            scroll_lock_px: 10.0,
            tap_max_px: 20.0,
            min_swipe_px: 50.0,
            max_vertical_px: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Also write JSON logs to the data directory
    pub file: bool,
    pub retention_days: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
            retention_days: 7,
        }
    }
}

impl AppConfig {
    /// Load configuration from a file, defaults if it does not exist
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content).map_err(AppError::from)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Like [`AppConfig::load_from`], but falls back to defaults and hands
    /// back the error for the caller to report once logging is up
    pub fn load_or_default(config_path: &Path) -> (Self, Option<anyhow::Error>) {
        match Self::load_from(config_path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "GalleryViewer", "GalleryViewer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

fn default_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    kb.insert(Command::Next.id().into(), vec!["ArrowRight".into()]);
    kb.insert(Command::Previous.id().into(), vec!["ArrowLeft".into()]);
    kb.insert(Command::Exit.id().into(), vec!["Escape".into(), "q".into(), "Q".into()]);
    kb.insert(Command::ToggleFullscreen.id().into(), vec!["f".into(), "F".into()]);
    kb.insert(Command::Delete.id().into(), vec!["Delete".into(), "Backspace".into()]);

    kb.insert(Command::ToggleSlideshow.id().into(), vec!["s".into()]);
    kb.insert(Command::TogglePause.id().into(), vec!["Space".into()]);
    kb.insert(Command::Faster.id().into(), vec!["-".into()]);
    kb.insert(Command::Slower.id().into(), vec!["+".into(), "=".into()]);

    kb
}

//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::timeline::{MAX_PAGE_LIMIT, MIN_PAGE_LIMIT};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brusio";
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_SCROLL_THRESHOLD: f32 = 0.9;
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid setting `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl LoadError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Output shape of the fmt tracing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Items per timeline page; becomes part of every query identity.
    pub page_size: u32,
    /// Scroll fraction that arms the next page fetch.
    pub scroll_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawFeedSettings {
    page_size: Option<u32>,
    scroll_threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    feed: RawFeedSettings,
    logging: RawLoggingSettings,
}

/// Load settings from the default file, the local `brusio.toml`, an optional
/// explicit file, and `BRUSIO_*` environment variables, in that precedence.
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BRUSIO").separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let page_size = raw.feed.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&page_size) {
            return Err(LoadError::invalid(
                "feed.page_size",
                format!("{page_size} outside {MIN_PAGE_LIMIT}..={MAX_PAGE_LIMIT}"),
            ));
        }

        let scroll_threshold = raw
            .feed
            .scroll_threshold
            .unwrap_or(DEFAULT_SCROLL_THRESHOLD);
        if !scroll_threshold.is_finite() || scroll_threshold <= 0.0 || scroll_threshold > 1.0 {
            return Err(LoadError::invalid(
                "feed.scroll_threshold",
                format!("{scroll_threshold} outside (0, 1]"),
            ));
        }

        let level = match raw.logging.level {
            Some(value) => LevelFilter::from_str(&value).map_err(|_| {
                LoadError::invalid(
                    "logging.level",
                    format!("`{value}` is not a log level (trace|debug|info|warn|error|off)"),
                )
            })?,
            None => DEFAULT_LOG_LEVEL,
        };

        Ok(Self {
            feed: FeedSettings {
                page_size,
                scroll_threshold,
            },
            logging: LoggingSettings {
                level,
                format: raw.logging.format.unwrap_or(LogFormat::Compact),
            },
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_raw(RawSettings::default())
            .expect("built-in defaults satisfy their own validation")
    }
}

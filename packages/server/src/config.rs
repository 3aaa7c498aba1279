//! Server configuration.
//!
//! Read from an optional TOML file; every field has a default. `BIND_ADDR`
//! and `PORT` override the `[server]` section, and the store password only
//! ever comes from `FIRE_MAP_DB_PASSWORD`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fire_map_database::db::StoreConfig;
use fire_map_database::schema::StoreSchema;
use fire_map_database_models::{CalendarBounds, RangeError};
use fire_map_geography::DEFAULT_NAME_PROPERTY;
use fire_map_spatial::DEFAULT_OBSERVED_AT_PROPERTY;
use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Config`].
    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        /// Path that was read.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// An environment override has an unusable value.
    #[error("Invalid value '{value}' for {name}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The calendar window is empty.
    #[error("Calendar window is inverted: {min} is after {max}")]
    Calendar {
        /// Configured minimum.
        min: NaiveDate,
        /// Configured maximum.
        max: NaiveDate,
    },

    /// A default date lies outside the calendar window.
    #[error("Invalid default date: {0}")]
    DefaultDate(#[from] RangeError),
}

/// Where fire detections are read from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// `PostGIS` database.
    #[default]
    Postgis,
    /// `GeoJSON` detections file joined in memory.
    Geojson,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[store]`
    pub store: StoreSection,
    /// `[boundaries]`
    pub boundaries: BoundariesConfig,
    /// `[calendar]`
    pub calendar: CalendarConfig,
    /// `[server]`
    pub server: ServerConfig,
}

/// Fire detection store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Which backend to use.
    pub backend: StoreBackend,
    /// `PostGIS` connection settings.
    #[serde(flatten)]
    pub connection: StoreConfig,
    /// `PostGIS` table and column names.
    pub schema: StoreSchema,
    /// Detections file for the `geojson` backend.
    pub detections_path: PathBuf,
    /// Timestamp property in the detections file.
    pub observed_at_property: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            connection: StoreConfig::default(),
            schema: StoreSchema::default(),
            detections_path: PathBuf::from("data/viirs_active_fire_detections.geojson"),
            observed_at_property: DEFAULT_OBSERVED_AT_PROPERTY.to_string(),
        }
    }
}

/// Borough boundary file settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoundariesConfig {
    /// `GeoJSON` `FeatureCollection` of borough polygons.
    pub path: PathBuf,
    /// Feature property holding the borough name.
    pub name_property: String,
}

impl Default for BoundariesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/alaska_borough_and_census_area_boundaries.geojson"),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

/// Date picker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Earliest selectable date.
    pub min: NaiveDate,
    /// Latest selectable date.
    pub max: NaiveDate,
    /// Start date selected on startup.
    pub default_start: Option<NaiveDate>,
    /// End date selected on startup.
    pub default_end: Option<NaiveDate>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            min: ymd(2022, 1, 1),
            max: ymd(2022, 12, 31),
            default_start: Some(ymd(2022, 4, 20)),
            default_end: Some(ymd(2022, 4, 25)),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

impl CalendarConfig {
    /// The selectable window.
    #[must_use]
    pub const fn bounds(&self) -> CalendarBounds {
        CalendarBounds {
            min: self.min,
            max: self.max,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: String,
    /// Listen port.
    pub port: u16,
    /// Directory of frontend static files.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("app/dist"),
        }
    }
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, an
    /// override is invalid, or the calendar settings are inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                log::info!("Loaded config from {}", path.display());
                config
            }
            None => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.store.connection = config.store.connection.with_password_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text does not describe a [`Config`].
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies `BIND_ADDR` and `PORT` overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `PORT` is not a port number.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("BIND_ADDR").filter(|a| !a.is_empty()) {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Env { name: "PORT", value: port })?;
        }
        Ok(())
    }

    /// Checks the calendar window and default selection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the window is inverted or a default date
    /// lies outside it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let calendar = &self.calendar;
        if calendar.min > calendar.max {
            return Err(ConfigError::Calendar {
                min: calendar.min,
                max: calendar.max,
            });
        }
        let bounds = calendar.bounds();
        for date in [calendar.default_start, calendar.default_end]
            .into_iter()
            .flatten()
        {
            bounds.check(date)?;
        }
        Ok(())
    }
}

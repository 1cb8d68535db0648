//! Configuration file support for the mortality dashboard
//!
//! This module handles parsing `mortalidad.toml` configuration files that
//! point the dashboard at its input files and tune the web server.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # mortalidad.toml
//!
//! [data]
//! # Directory holding the input files
//! dir = "data"
//!
//! # Glob patterns resolved inside `dir`; the match with the latest `_DD-MM-YY` export date wins
//! deaths = "NoFetal2019_CE_*.xlsx"
//! divipola = "Divipola_CE_*.xlsx"
//! causes = "CodigosDeMuerte_CE_*.xlsx"
//! geojson = "col_departamentos.geojson"
//!
//! [map]
//! # Property path matched against department names
//! feature_id_key = "properties.NOMBRE_DPT"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8050
//! open_browser = true
//!
//! [ui]
//! title = "Mortalidad en Colombia – 2019"
//! assets_dir = "assets"
//! logo = "logo.svg"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Input file section
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding the input files
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Main death records (one row per death)
    #[serde(default = "default_deaths")]
    pub deaths: String,

    /// Department and municipality code registry
    #[serde(default = "default_divipola")]
    pub divipola: String,

    /// CIE-10 cause-of-death descriptions
    #[serde(default = "default_causes")]
    pub causes: String,

    /// Department boundaries; optional at runtime
    #[serde(default = "default_geojson")]
    pub geojson: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_deaths() -> String {
    "NoFetal2019_CE_*.xlsx".to_string()
}

fn default_divipola() -> String {
    "Divipola_CE_*.xlsx".to_string()
}

fn default_causes() -> String {
    "CodigosDeMuerte_CE_*.xlsx".to_string()
}

fn default_geojson() -> String {
    "col_departamentos.geojson".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            deaths: default_deaths(),
            divipola: default_divipola(),
            causes: default_causes(),
            geojson: default_geojson(),
        }
    }
}

/// Choropleth map section
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Dotted path into each GeoJSON feature holding the department name
    #[serde(default = "default_feature_id_key")]
    pub feature_id_key: String,
}

fn default_feature_id_key() -> String {
    "properties.NOMBRE_DPT".to_string()
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            feature_id_key: default_feature_id_key(),
        }
    }
}

/// Web server section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Open the dashboard in the default browser on startup
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8050
}

fn default_open_browser() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open_browser: default_open_browser(),
        }
    }
}

/// Page text and extra assets
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    #[serde(default = "default_footer")]
    pub footer: String,

    /// Directory served under `/assets/` (logos, extra stylesheets)
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,

    /// Sidebar logo, a file name inside `assets_dir`
    #[serde(default)]
    pub logo: Option<String>,
}

fn default_title() -> String {
    "Mortalidad en Colombia – 2019".to_string()
}

fn default_subtitle() -> String {
    "Exploración interactiva de datos de mortalidad a nivel nacional".to_string()
}

fn default_footer() -> String {
    "Datos: DANE, Estadísticas Vitales 2019".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            footer: default_footer(),
            assets_dir: None,
            logo: None,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub ui: UiConfig,
}

impl DashboardConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve relative data and asset directories against `base`
    ///
    /// Used so that a config file found in a parent directory still refers
    /// to paths next to itself.
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.data.dir.is_relative() {
            self.data.dir = base.join(&self.data.dir);
        }
        if let Some(assets) = self.ui.assets_dir.take() {
            self.ui.assets_dir = Some(if assets.is_relative() {
                base.join(assets)
            } else {
                assets
            });
        }
        self
    }
}

/// Load configuration from an explicit file path
pub fn load_config_file(path: &Path) -> Result<DashboardConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let config = DashboardConfig::from_toml(&content)?;
    Ok(match path.parent() {
        Some(base) if !base.as_os_str().is_empty() => config.relative_to(base),
        _ => config,
    })
}

/// Load configuration by searching from `start_path` upward
///
/// Falls back to the defaults when no config file exists.
pub fn load_config(start_path: &Path) -> Result<DashboardConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => load_config_file(&path),
        None => Ok(DashboardConfig::default()),
    }
}

/// Find the config file by searching up the directory tree
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = ["mortalidad.toml", ".mortalidad.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

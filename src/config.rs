//! TOML configuration: default inputs, server address, presentation.
//!
//! ```toml
//! [defaults]
//! baselineRatePct = "3.5"
//! dailyVisitors   = "40000"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8888
//!
//! [presentation]
//! title        = "Checkout experiment planner"
//! subtitle     = "Growth team"
//! theme        = "light"
//! show_toggles = false
//! ```
//!
//! Every table and key is optional. One calculator serves every page
//! variant; the variants differ only in their `[presentation]` table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::validate::{Field, RawInputs};

/// Overrides for the built-in default inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DefaultInputs {
    pub baseline_rate_pct: Option<String>,
    pub uplift_pct: Option<String>,
    pub significance_pct: Option<String>,
    pub power_pct: Option<String>,
    pub daily_visitors: Option<String>,
    pub variant_traffic_pct: Option<String>,
}

impl DefaultInputs {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::BaselineRatePct => &self.baseline_rate_pct,
            Field::UpliftPct => &self.uplift_pct,
            Field::SignificancePct => &self.significance_pct,
            Field::PowerPct => &self.power_pct,
            Field::DailyVisitors => &self.daily_visitors,
            Field::VariantTrafficPct => &self.variant_traffic_pct,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Built-in defaults with any configured values laid over them.
    pub fn resolve(&self) -> RawInputs {
        let mut raw = RawInputs::default();
        for field in Field::ALL {
            if let Some(value) = self.get(field) {
                raw.set(field, value);
            }
        }
        raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8888 }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// Cosmetic knobs that used to be separate copies of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub title: String,
    pub subtitle: String,
    pub theme: Theme,
    pub show_toggles: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            title: "A/B Test Sample Size Calculator".into(),
            subtitle: "How many users, and how many days?".into(),
            theme: Theme::Dark,
            show_toggles: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizerConfig {
    pub defaults: DefaultInputs,
    pub server: ServerConfig,
    pub presentation: PresentationConfig,
}

impl SizerConfig {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text, &shown)?;
        debug!(path = %shown, "loaded config");
        Ok(cfg)
    }

    /// Load `path` when given, otherwise the built-in configuration.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

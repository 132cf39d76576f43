//! Refinement loop configuration
//!
//! Loads the `[refinement]` table from a TOML file and validates it before any
//! iteration runs. Every recognized option lives on [`RefinementConfig`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefinerFile {
    pub refinement: RefinementConfig,
}

/// Termination and scale settings for one refinement loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefinementConfig {
    /// Score at or above which the loop stops with success
    pub success_threshold: f64,
    /// Hard cap on producer/scorer rounds (>= 1)
    pub max_iterations: usize,
    /// Number of trailing scores inspected for a plateau (>= 2)
    #[serde(default = "default_plateau_window")]
    pub plateau_window: usize,
    /// Maximum score spread inside the window that still counts as a plateau
    #[serde(default)]
    pub plateau_epsilon: f64,
    /// Valid score bounds, written as `[min, max]`
    #[serde(default)]
    pub scale: ScoreScale,
    /// Wall-clock budget checked between iterations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Score considered good enough when the budget runs out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptable_score: Option<f64>,
}

fn default_plateau_window() -> usize {
    3
}

/// Closed score range `[min, max]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl ScoreScale {
    /// Unit scale used by evaluators that report fractions
    pub const UNIT: ScoreScale = ScoreScale { min: 0.0, max: 1.0 };
    /// Ten-point scale used by complexity assessments
    pub const TEN_POINT: ScoreScale = ScoreScale {
        min: 1.0,
        max: 10.0,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }

    /// Point located `fraction` of the way from `min` to `max`
    pub fn fraction(&self, fraction: f64) -> f64 {
        self.min + (self.max - self.min) * fraction
    }
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self::UNIT
    }
}

impl From<(f64, f64)> for ScoreScale {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<ScoreScale> for (f64, f64) {
    fn from(scale: ScoreScale) -> Self {
        (scale.min, scale.max)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ConfigError {
    fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig(message.into())
    }
}

impl RefinementConfig {
    /// Minimal configuration; every other option takes its default
    pub fn new(success_threshold: f64, max_iterations: usize) -> Self {
        Self {
            success_threshold,
            max_iterations,
            plateau_window: default_plateau_window(),
            plateau_epsilon: 0.0,
            scale: ScoreScale::default(),
            timeout_secs: None,
            acceptable_score: None,
        }
    }

    pub fn with_plateau(mut self, window: usize, epsilon: f64) -> Self {
        self.plateau_window = window;
        self.plateau_epsilon = epsilon;
        self
    }

    pub fn with_scale(mut self, scale: ScoreScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Load and validate the `[refinement]` table of a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_toml_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the `[refinement]` table without validating it
    ///
    /// For callers that layer overrides on top of the file and call
    /// [`validate`](Self::validate) once afterwards.
    pub fn read_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml_str(&content)
    }

    fn parse_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: RefinerFile = toml::from_str(content)?;
        Ok(file.refinement)
    }

    /// Reject configurations the loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations < 1 {
            return Err(ConfigError::invalid(format!(
                "max_iterations must be at least 1, got {}",
                self.max_iterations
            )));
        }

        if self.plateau_window < 2 {
            return Err(ConfigError::invalid(format!(
                "plateau_window must be at least 2, got {}",
                self.plateau_window
            )));
        }

        if !self.plateau_epsilon.is_finite() || self.plateau_epsilon < 0.0 {
            return Err(ConfigError::invalid(format!(
                "plateau_epsilon must be a finite value >= 0, got {}",
                self.plateau_epsilon
            )));
        }

        let scale = self.scale;
        if !scale.min.is_finite() || !scale.max.is_finite() || scale.min >= scale.max {
            return Err(ConfigError::invalid(format!(
                "scale must be [min, max] with finite min < max, got [{}, {}]",
                scale.min, scale.max
            )));
        }

        if !self.success_threshold.is_finite() || !scale.contains(self.success_threshold) {
            return Err(ConfigError::invalid(format!(
                "success_threshold {} must lie within scale [{}, {}]",
                self.success_threshold, scale.min, scale.max
            )));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("timeout_secs must be greater than 0"));
        }

        if let Some(acceptable) = self.acceptable_score {
            if !acceptable.is_finite() || !scale.contains(acceptable) {
                return Err(ConfigError::invalid(format!(
                    "acceptable_score {} must lie within scale [{}, {}]",
                    acceptable, scale.min, scale.max
                )));
            }
        }

        Ok(())
    }

    /// Wall-clock budget, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Configured acceptable score, or 70% of the way up the scale
    pub fn acceptable_score(&self) -> f64 {
        self.acceptable_score.unwrap_or(self.scale.fraction(0.7))
    }

    /// Render back to the on-disk TOML layout
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&RefinerFile {
            refinement: self.clone(),
        })
    }
}

use crate::projection::SampleEncoding;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Optional TOML configuration. Every section and field has a default, so an
/// empty file is valid.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProjectionConfig {
    /// Must match the sample representation of the decoder that produced the input.
    #[serde(default)]
    pub encoding: SampleEncoding,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlotConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_points: default_max_points(),
        }
    }
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    600
}

fn default_max_points() -> usize {
    4096
}

pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).context("parsing config")
}

pub fn read_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("config {}", path.display()))
}

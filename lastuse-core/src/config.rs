//! Configuration loading from lastuse.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{IoResultExt, LastuseError, LastuseResult};
use crate::validate::MemberAccess;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "lastuse.toml";

/// Main configuration structure for lastuse.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LastuseConfig {
    /// Analysis configuration.
    pub analysis: Option<AnalysisConfig>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// What to scan and how to validate it.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Policy for identifiers after `.` or `->`.
    pub member_access: Option<MemberAccess>,
    /// File extensions scanned when walking directories.
    pub extensions: Option<Vec<String>>,
    /// Extra directory names to skip.
    pub exclude: Option<Vec<String>>,
}

/// Output configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<OutputFormat>,
    /// Print source line and caret notes under each finding.
    pub notes: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl LastuseConfig {
    pub fn member_access(&self) -> Option<MemberAccess> {
        self.analysis.as_ref().and_then(|a| a.member_access)
    }

    pub fn extensions(&self) -> Option<&[String]> {
        self.analysis.as_ref().and_then(|a| a.extensions.as_deref())
    }

    pub fn exclude(&self) -> &[String] {
        self.analysis
            .as_ref()
            .and_then(|a| a.exclude.as_deref())
            .unwrap_or_default()
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.output.as_ref().and_then(|o| o.format)
    }

    pub fn notes(&self) -> Option<bool> {
        self.output.as_ref().and_then(|o| o.notes)
    }
}

/// Parses configuration text.
pub fn parse_config(content: &str) -> std::result::Result<LastuseConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Loads an explicitly named configuration file.
pub fn load_config_file(path: &Path) -> LastuseResult<LastuseConfig> {
    let content = fs::read_to_string(path).with_path(path)?;
    parse_config(&content).map_err(|e| LastuseError::config(path, e.to_string()))
}

/// Loads configuration from lastuse.toml in `root` if it exists.
pub fn load_config(root: &Path) -> Result<Option<LastuseConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let cfg = load_config_file(&path).context("Invalid lastuse.toml")?;
    Ok(Some(cfg))
}

//! Configuration loading for trialgraph.
//! Reads trialgraph.toml from the current directory or the path in TRIALGRAPH_CONFIG;
//! environment variables override individual fields.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use trialgraph_common::{Phase, TrialStatus};
use trialgraph_ingestion::EligibilityCriteria;
use trialgraph_kg::TransformOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub transform: TransformOptions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the extracted pipe-delimited AACT tables.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("./data/extracted") }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_min_studies")]
    pub min_studies: usize,
    #[serde(default = "default_phases")]
    pub phases: Vec<String>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_studies: default_min_studies(),
            phases: default_phases(),
            statuses: default_statuses(),
        }
    }
}

fn default_min_studies() -> usize { 500 }

fn default_phases() -> Vec<String> {
    ["Phase 1", "Phase 2", "Phase 3", "Phase 4", "Not Applicable"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_statuses() -> Vec<String> {
    ["RECRUITING", "ACTIVE_NOT_RECRUITING", "COMPLETED", "ENROLLING_BY_INVITATION"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_staged_dir")]
    pub staged_dir: PathBuf,
    #[serde(default = "bool_true")]
    pub write_load_plan: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { staged_dir: default_staged_dir(), write_load_plan: true }
    }
}

fn default_staged_dir() -> PathBuf { PathBuf::from("./data/staged") }
fn bool_true()          -> bool    { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: default_batch_size() }
    }
}

fn default_batch_size() -> usize { 1000 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String { "info".to_string() }


impl Config {
    /// Load configuration from trialgraph.toml, then apply environment overrides.
    /// `explicit` wins over TRIALGRAPH_CONFIG. A missing default file means defaults;
    /// a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var("TRIALGRAPH_CONFIG") {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from("trialgraph.toml"), false),
            },
        };

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if required {
            anyhow::bail!("Config file not found: {}", path.display());
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Override fields from environment-style variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AACT_DATA_DIR") {
            self.source.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("STAGED_DIR") {
            self.output.staged_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MIN_STUDIES") {
            self.filter.min_studies = v.trim().parse().with_context(|| format!("MIN_STUDIES={v}"))?;
        }
        if let Some(v) = lookup("PHASES") {
            self.filter.phases = split_list(&v);
        }
        if let Some(v) = lookup("STATUS_LIST") {
            self.filter.statuses = split_list(&v);
        }
        if let Some(v) = lookup("BATCH_SIZE") {
            self.loader.batch_size = v.trim().parse().with_context(|| format!("BATCH_SIZE={v}"))?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v.trim().to_lowercase();
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.filter.min_studies < 1 {
            anyhow::bail!("filter.min_studies must be at least 1");
        }
        if self.loader.batch_size < 1 {
            anyhow::bail!("loader.batch_size must be at least 1");
        }
        self.eligibility()?;
        Ok(())
    }

    /// Typed eligibility criteria for the ingestion stage.
    pub fn eligibility(&self) -> anyhow::Result<EligibilityCriteria> {
        let phases = self
            .filter
            .phases
            .iter()
            .map(|p| Phase::parse(p).with_context(|| format!("unknown phase '{p}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let statuses = self
            .filter
            .statuses
            .iter()
            .map(|s| TrialStatus::parse(s).with_context(|| format!("unknown status '{s}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if phases.is_empty() || statuses.is_empty() {
            anyhow::bail!("filter.phases and filter.statuses must not be empty");
        }
        Ok(EligibilityCriteria { phases, statuses, min_studies: self.filter.min_studies })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VocabError};
use crate::levels::DEFAULT_LEVELS;

pub const CONFIG_FILE: &str = "vocab_assess.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub label: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandConfig {
    #[serde(default = "default_num_bands")]
    pub num_bands: u32,
    #[serde(default = "default_total_words")]
    pub total_words: u32,
    // disjoint sessions per band
    #[serde(default = "default_sessions")]
    pub sessions: u32,
    #[serde(default = "default_words_per_session")]
    pub words_per_session: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickConfig {
    #[serde(default = "default_num_words")]
    pub num_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    #[serde(default = "default_initial_level")]
    pub initial_level: String,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    #[serde(default)]
    pub bands: BandConfig,
    #[serde(default)]
    pub quick: QuickConfig,
    #[serde(default)]
    pub adaptive: AdaptiveConfig,
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelThreshold>,
}

fn default_num_bands() -> u32 {
    10
}
fn default_total_words() -> u32 {
    60_000
}
fn default_sessions() -> u32 {
    3
}
fn default_words_per_session() -> usize {
    10
}
fn default_num_words() -> usize {
    50
}
fn default_initial_level() -> String {
    "B1".to_string()
}
fn default_max_questions() -> usize {
    25
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("assessment_data")
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/COCA60000.txt")
}
fn default_levels() -> Vec<LevelThreshold> {
    DEFAULT_LEVELS
        .iter()
        .map(|&(label, size)| LevelThreshold {
            label: label.to_string(),
            size,
        })
        .collect()
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            num_bands: default_num_bands(),
            total_words: default_total_words(),
            sessions: default_sessions(),
            words_per_session: default_words_per_session(),
        }
    }
}

impl Default for QuickConfig {
    fn default() -> Self {
        Self {
            num_words: default_num_words(),
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            initial_level: default_initial_level(),
            max_questions: default_max_questions(),
        }
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            corpus_path: default_corpus_path(),
            bands: BandConfig::default(),
            quick: QuickConfig::default(),
            adaptive: AdaptiveConfig::default(),
            levels: default_levels(),
        }
    }
}

impl AssessmentConfig {
    pub fn user_results_dir(&self) -> PathBuf {
        self.data_dir.join("user_results")
    }

    pub fn word_pool_path(&self) -> PathBuf {
        self.data_dir.join("word_frequency.json")
    }

    pub fn validate(&self) -> Result<()> {
        let bands = &self.bands;
        if bands.num_bands == 0 {
            return Err(VocabError::InvalidConfig("bands.num_bands must be at least 1".into()));
        }
        if bands.sessions == 0 {
            return Err(VocabError::InvalidConfig("bands.sessions must be at least 1".into()));
        }
        if bands.total_words < bands.num_bands {
            return Err(VocabError::InvalidConfig(format!(
                "bands.total_words ({}) must be at least bands.num_bands ({})",
                bands.total_words, bands.num_bands
            )));
        }
        if self.levels.is_empty() {
            return Err(VocabError::InvalidConfig("at least one level is required".into()));
        }

        let mut seen = HashSet::new();
        for level in &self.levels {
            if !seen.insert(level.label.as_str()) {
                return Err(VocabError::InvalidConfig(format!(
                    "duplicate level label '{}'",
                    level.label
                )));
            }
        }
        if !seen.contains(self.adaptive.initial_level.as_str()) {
            return Err(VocabError::InvalidConfig(format!(
                "adaptive.initial_level '{}' is not a configured level",
                self.adaptive.initial_level
            )));
        }
        Ok(())
    }
}

pub fn parse_config(text: &str) -> Result<AssessmentConfig> {
    let config: AssessmentConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

// Explicit path, else vocab_assess.toml in the working dir, else defaults.
pub fn load_config_from(path: Option<&Path>) -> Result<AssessmentConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => {
            return Err(VocabError::InvalidConfig(format!(
                "config file not found: {}",
                p.display()
            )))
        }
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    match config_path {
        Some(p) => {
            info!(path = %p.display(), "Loading config");
            parse_config(&fs::read_to_string(&p)?)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(AssessmentConfig::default())
        }
    }
}

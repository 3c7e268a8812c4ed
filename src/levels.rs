use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::LevelThreshold;
use crate::error::{Result, VocabError};

// CEFR levels with approximate vocabulary sizes
pub const DEFAULT_LEVELS: [(&str, u32); 6] = [
    ("A1", 500),    // Beginner
    ("A2", 1000),   // Elementary
    ("B1", 2000),   // Intermediate
    ("B2", 4000),   // Upper intermediate
    ("C1", 8000),   // Advanced
    ("C2", 16000),  // Proficient
];

pub const DEFAULT_LEVEL_WORDS: [(&str, [&str; 10]); 6] = [
    ("A1", ["the", "be", "to", "of", "and", "a", "in", "that", "have", "I"]),
    ("A2", ["book", "school", "friend", "family", "house", "work", "day", "time", "year", "food"]),
    ("B1", ["consider", "expect", "determine", "receive", "provide", "explain", "contain", "maintain", "establish", "occur"]),
    ("B2", ["acquire", "analyze", "comprehensive", "interpret", "implement", "policy", "concept", "perspective", "framework", "conclude"]),
    ("C1", ["endeavor", "rationalize", "methodology", "facilitate", "fundamental", "contingent", "constitute", "subsequent", "albeit", "intrinsic"]),
    ("C2", ["ubiquitous", "amalgamate", "esoteric", "superfluous", "paradigm", "juxtapose", "paradoxical", "quintessential", "antithetical", "idiosyncrasy"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelScale {
    levels: Vec<LevelThreshold>,
}

impl LevelScale {
    pub fn new(levels: Vec<LevelThreshold>) -> Result<Self> {
        if levels.is_empty() {
            return Err(VocabError::InvalidConfig("level scale is empty".into()));
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelThreshold> {
        self.levels.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.levels.iter().map(|l| l.label.clone()).collect()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.label == label)
    }

    pub fn size_of(&self, label: &str) -> Option<u32> {
        self.levels.iter().find(|l| l.label == label).map(|l| l.size)
    }

    pub fn label_at(&self, idx: usize) -> Option<&str> {
        self.levels.get(idx).map(|l| l.label.as_str())
    }

    pub fn lowest(&self) -> &LevelThreshold {
        &self.levels[0]
    }

    pub fn highest(&self) -> &LevelThreshold {
        &self.levels[self.levels.len() - 1]
    }
}

impl Default for LevelScale {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS
                .iter()
                .map(|&(label, size)| LevelThreshold {
                    label: label.to_string(),
                    size,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPool {
    words: HashMap<String, Vec<String>>,
}

impl WordPool {
    pub fn new(words: HashMap<String, Vec<String>>) -> Self {
        Self { words }
    }

    pub fn builtin() -> Self {
        let words = DEFAULT_LEVEL_WORDS
            .iter()
            .map(|(level, words)| {
                (
                    level.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect();
        Self { words }
    }

    // A missing pool is seeded with the built-in sample and written back.
    pub fn load_or_seed(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path)?;
            let words: HashMap<String, Vec<String>> = serde_json::from_reader(file)?;
            debug!(path = %path.display(), levels = words.len(), "Loaded word pool");
            return Ok(Self { words });
        }

        let pool = Self::builtin();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        serde_json::to_writer_pretty(file, &pool.words)?;
        info!(path = %path.display(), "Seeded word pool with built-in sample");
        Ok(pool)
    }

    pub fn words_for(&self, level: &str) -> &[String] {
        self.words.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn check_coverage(&self, scale: &LevelScale) {
        for level in scale.iter() {
            if self.words_for(&level.label).is_empty() {
                warn!(level = %level.label, "No words available for level");
            }
        }
    }
}

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::{debug, warn};

use crate::levels::LevelScale;
use crate::types::{AssessmentResult, QuickTestWordItem};

pub const LEVEL_REACHED_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
struct LevelCounts {
    total: u32,
    known: u32,
}

pub fn round_to_hundred(value: f64) -> u32 {
    ((value / 100.0).round_ties_even() * 100.0) as u32
}

pub fn level_for_size(scale: &LevelScale, vocabulary_size: u32) -> String {
    let mut level = scale.lowest().label.as_str();
    for threshold in scale.iter() {
        if f64::from(vocabulary_size) >= f64::from(threshold.size) * LEVEL_REACHED_RATIO {
            level = threshold.label.as_str();
        }
    }
    level.to_string()
}

pub fn ordered_proportions<'a>(scale: &'a LevelScale, result: &AssessmentResult) -> Vec<(&'a str, f64)> {
    scale
        .iter()
        .filter_map(|level| {
            result
                .level_proportions
                .get(&level.label)
                .map(|&p| (level.label.as_str(), p))
        })
        .collect()
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

pub fn score_test(
    scale: &LevelScale,
    words: &[QuickTestWordItem],
    test_id: u32,
    answers: &HashMap<String, bool>,
) -> AssessmentResult {
    let mut counts: HashMap<&str, LevelCounts> = HashMap::new();
    for item in words {
        if scale.index_of(&item.level).is_none() {
            warn!(word = %item.word, level = %item.level, "Ignoring word with unknown level");
            continue;
        }
        let entry = counts.entry(item.level.as_str()).or_default();
        entry.total += 1;
        if answers.get(&item.word).copied().unwrap_or(false) {
            entry.known += 1;
        }
    }

    let mut level_proportions = BTreeMap::new();
    let mut proportions = Vec::with_capacity(scale.len());
    let mut weighted_size = 0.0;
    for threshold in scale.iter() {
        let c = counts.get(threshold.label.as_str()).copied().unwrap_or_default();
        let proportion = if c.total > 0 {
            f64::from(c.known) / f64::from(c.total)
        } else {
            0.0
        };
        weighted_size += f64::from(threshold.size) * proportion;
        proportions.push(proportion);
        level_proportions.insert(threshold.label.clone(), proportion);
    }

    let vocabulary_size = round_to_hundred(weighted_size);
    let cefr_level = level_for_size(scale, vocabulary_size);
    let confidence = (100.0 - variance(&proportions) * 100.0)
        .clamp(0.0, 100.0)
        .round_ties_even() as u32;

    debug!(test_id, vocabulary_size, cefr_level = %cefr_level, confidence, "Scored test");

    AssessmentResult {
        vocabulary_size,
        cefr_level,
        level_proportions,
        confidence,
        test_id,
        timestamp: Utc::now(),
    }
}

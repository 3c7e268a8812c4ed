use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{Result, VocabError};
use crate::levels::{LevelScale, WordPool};
use crate::types::{AdaptiveTestState, LevelCount, QuickTest, QuickTestWordItem};

pub const MIN_WORDS_PER_LEVEL: usize = 3;

pub const ADAPTIVE_SEED_WORDS: usize = 5;

fn new_test_id<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1000..=9999)
}

// Remainder words go one each to the hardest levels.
pub fn level_distribution(scale: &LevelScale, num_words: usize) -> Vec<LevelCount> {
    let level_count = scale.len();
    let per_level = (num_words / level_count).max(MIN_WORDS_PER_LEVEL);
    let remaining = num_words.saturating_sub(per_level * level_count);
    let first_extra = level_count - remaining.min(level_count);

    scale
        .iter()
        .enumerate()
        .map(|(idx, level)| LevelCount {
            level: level.label.clone(),
            count: per_level + usize::from(idx >= first_extra),
        })
        .collect()
}

pub fn generate_quick_test<R: Rng + ?Sized>(
    scale: &LevelScale,
    pool: &WordPool,
    num_words: usize,
    rng: &mut R,
) -> QuickTest {
    let distribution = level_distribution(scale, num_words);

    let available: usize = distribution
        .iter()
        .map(|entry| entry.count.min(pool.words_for(&entry.level).len()))
        .sum();
    let mut words = Vec::with_capacity(available);
    for entry in &distribution {
        let level_words = pool.words_for(&entry.level);
        words.extend(
            level_words
                .choose_multiple(rng, entry.count.min(level_words.len()))
                .map(|word| QuickTestWordItem {
                    word: word.clone(),
                    level: entry.level.clone(),
                }),
        );
    }
    words.shuffle(rng);

    let test = QuickTest {
        words,
        distribution,
        test_id: new_test_id(rng),
    };
    debug!(test_id = test.test_id, requested = num_words, words = test.words.len(), "Generated quick test");
    test
}

pub fn generate_adaptive_test<R: Rng + ?Sized>(
    scale: &LevelScale,
    pool: &WordPool,
    initial_level: &str,
    max_questions: usize,
    rng: &mut R,
) -> Result<AdaptiveTestState> {
    let current_level_idx = scale
        .index_of(initial_level)
        .ok_or_else(|| VocabError::UnknownLevel(initial_level.to_string()))?;

    let level_words = pool.words_for(initial_level);
    let words: Vec<QuickTestWordItem> = level_words
        .choose_multiple(rng, ADAPTIVE_SEED_WORDS.min(level_words.len()))
        .map(|word| QuickTestWordItem {
            word: word.clone(),
            level: initial_level.to_string(),
        })
        .collect();

    let state = AdaptiveTestState {
        next_question_index: words.len(),
        words,
        current_level_idx,
        levels: scale.labels(),
        max_questions,
        complete: false,
        test_id: new_test_id(rng),
    };
    debug!(test_id = state.test_id, initial_level, max_questions, "Generated adaptive test");
    Ok(state)
}

pub fn next_adaptive_question<R: Rng + ?Sized>(
    pool: &WordPool,
    state: &mut AdaptiveTestState,
    knew_previous: bool,
    rng: &mut R,
) -> Result<()> {
    if state.complete {
        return Err(VocabError::TestComplete(state.test_id));
    }

    let last = state.levels.len().saturating_sub(1);
    let level_idx = if knew_previous {
        (state.current_level_idx + 1).min(last)
    } else {
        state.current_level_idx.saturating_sub(1)
    };
    state.current_level_idx = level_idx;

    let Some(level) = state.levels.get(level_idx).cloned() else {
        state.complete = true;
        return Ok(());
    };

    let used: HashSet<&str> = state.words.iter().map(|item| item.word.as_str()).collect();
    let available: Vec<&String> = pool
        .words_for(&level)
        .iter()
        .filter(|word| !used.contains(word.as_str()))
        .collect();

    match available.choose(rng) {
        Some(word) if state.words.len() < state.max_questions => {
            state.words.push(QuickTestWordItem {
                word: (*word).clone(),
                level: level.clone(),
            });
            state.next_question_index = state.words.len() - 1;
            debug!(test_id = state.test_id, level = %level, question = state.words.len(), "Next adaptive question");
        }
        _ => {
            state.complete = true;
            debug!(test_id = state.test_id, asked = state.words.len(), "Adaptive test complete");
        }
    }

    Ok(())
}

//! Frequency bands and per-session word selection.
//!
//! The corpus is split into `num_bands` contiguous rank ranges of equal
//! width. Each band test session draws a fixed number of words from every
//! band; when a band is large enough the sessions get disjoint slices of it,
//! so a user repeating the test with a new session sees new words.

use std::collections::BTreeMap;
use std::hash::Hasher;

use fnv::FnvHasher;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::BandConfig;
use crate::types::{FrequencyEntry, TestWord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandLayout {
    num_bands: u32,
    total_words: u32,
    sessions: u32,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self::from_config(&BandConfig::default())
    }
}

impl BandLayout {
    pub fn new(num_bands: u32, total_words: u32, sessions: u32) -> Self {
        Self {
            num_bands: num_bands.max(1),
            total_words,
            sessions: sessions.max(1),
        }
    }

    pub fn from_config(config: &BandConfig) -> Self {
        Self::new(config.num_bands, config.total_words, config.sessions)
    }

    pub fn num_bands(&self) -> u32 {
        self.num_bands
    }

    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    pub fn words_per_band(&self) -> u32 {
        (self.total_words / self.num_bands).max(1)
    }

    // Ranks <= 0 land in band 1, ranks past total_words in the last band.
    pub fn band_of(&self, rank: i64) -> u32 {
        if rank <= 0 {
            return 1;
        }
        let wpb = i64::from(self.words_per_band());
        let band = (rank + wpb - 1) / wpb;
        band.min(i64::from(self.num_bands)) as u32
    }

    pub fn band_range(&self, band: u32) -> (u32, u32) {
        let band = band.clamp(1, self.num_bands);
        let wpb = self.words_per_band();
        ((band - 1) * wpb + 1, band * wpb)
    }

    pub fn clamp_band(&self, band: u32) -> u32 {
        band.clamp(1, self.num_bands)
    }

    // Membership is reproducible per (corpus, session); order is not.
    pub fn select_session_words(
        &self,
        corpus: &[FrequencyEntry],
        session: u32,
        words_per_session: usize,
    ) -> Vec<TestWord> {
        self.select_session_words_with(corpus, session, words_per_session, &mut rand::thread_rng())
    }

    pub fn select_session_words_with<R: Rng + ?Sized>(
        &self,
        corpus: &[FrequencyEntry],
        session: u32,
        words_per_session: usize,
        rng: &mut R,
    ) -> Vec<TestWord> {
        let mut selected = self.session_members(corpus, session, words_per_session);
        selected.shuffle(rng);
        selected
    }

    pub fn session_members(
        &self,
        corpus: &[FrequencyEntry],
        session: u32,
        words_per_session: usize,
    ) -> Vec<TestWord> {
        if corpus.is_empty() {
            return Vec::new();
        }

        let mut bands: BTreeMap<u32, Vec<&FrequencyEntry>> = BTreeMap::new();
        for entry in corpus {
            bands
                .entry(self.band_of(i64::from(entry.rank)))
                .or_default()
                .push(entry);
        }

        let total_selections = words_per_session.saturating_mul(self.sessions as usize);
        let mut selected = Vec::with_capacity(
            bands
                .values()
                .map(|band_words| band_words.len().min(words_per_session))
                .sum(),
        );

        for band in 1..=self.num_bands {
            let band_words = bands.get(&band).map(Vec::as_slice).unwrap_or(&[]);

            let slice: Vec<&FrequencyEntry> = if band_words.len() >= total_selections {
                let start = (session.saturating_sub(1) as usize).saturating_mul(words_per_session);
                band_words
                    .iter()
                    .skip(start)
                    .take(words_per_session)
                    .copied()
                    .collect()
            } else {
                // Too few words to give every session its own slice; sample
                // instead, which lets sessions overlap.
                let mut rng = session_rng(session, band);
                let amount = words_per_session.min(band_words.len());
                debug!(band, session, available = band_words.len(), amount, "Sampling small band");
                band_words
                    .choose_multiple(&mut rng, amount)
                    .copied()
                    .collect()
            };

            selected.extend(slice.into_iter().map(|entry| TestWord {
                word: entry.word.clone(),
                rank: entry.rank,
                band,
            }));
        }

        debug!(session, words = selected.len(), "Selected session words");
        selected
    }
}

fn session_rng(session: u32, band: u32) -> ChaCha8Rng {
    let mut hasher = FnvHasher::default();
    hasher.write(format!("vocab_test_session_{session}_band_{band}").as_bytes());
    ChaCha8Rng::seed_from_u64(hasher.finish())
}

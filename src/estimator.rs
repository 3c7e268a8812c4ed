//! Vocabulary size estimate from frequency-band answers.
//!
//! Each band is treated as a stratum of `words_per_band` equally difficult
//! words: the share of tested words the user knew is scaled up to the whole
//! band, and the per-band figures are summed.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::bands::BandLayout;
use crate::error::Result;
use crate::types::{AnswerRecord, BandResult, BandStat, SessionAnswers, VocabEstimate};

pub fn band_stats(layout: &BandLayout, answers: &SessionAnswers) -> BTreeMap<u32, BandStat> {
    let mut stats: BTreeMap<u32, BandStat> = BTreeMap::new();

    for (session, records) in answers {
        for record in records {
            let band = layout.clamp_band(record.band);
            if band != record.band {
                warn!(
                    session,
                    word = %record.word,
                    band = record.band,
                    clamped = band,
                    "Answer band out of range"
                );
            }

            let stat = stats.entry(band).or_insert(BandStat {
                band,
                ..BandStat::default()
            });
            stat.tested += 1;
            if record.known {
                stat.known += 1;
            }
        }
    }

    stats
}

pub fn estimate(layout: &BandLayout, answers: &SessionAnswers) -> VocabEstimate {
    let band_size = f64::from(layout.words_per_band());
    let mut total_vocab_size = 0;
    let mut band_results = Vec::new();

    // BTreeMap iteration keeps the results sorted by band.
    for stat in band_stats(layout, answers).into_values() {
        if stat.tested == 0 {
            continue;
        }

        let ratio = f64::from(stat.known) / f64::from(stat.tested);
        let percentage = (ratio * 100.0 * 10.0).round_ties_even() / 10.0;
        let estimated_known = (band_size * ratio).round_ties_even() as u32;
        let (start_rank, end_rank) = layout.band_range(stat.band);

        total_vocab_size += estimated_known;
        band_results.push(BandResult {
            band: stat.band,
            range: format!("{start_rank}-{end_rank}"),
            start_rank,
            end_rank,
            tested: stat.tested,
            known: stat.known,
            percentage,
            estimated_known,
        });
    }

    debug!(
        total_vocab_size,
        bands = band_results.len(),
        sessions = answers.len(),
        "Estimated vocabulary size"
    );

    VocabEstimate {
        total_vocab_size,
        band_results,
    }
}

#[derive(Debug, Deserialize)]
struct LooseAnswer {
    #[serde(default)]
    band: Option<u32>,
    #[serde(default)]
    known: Option<bool>,
}

// Missing band counts as 1, missing known as false.
pub fn parse_session_answers(json: &str) -> Result<SessionAnswers> {
    let raw: BTreeMap<u32, BTreeMap<String, LooseAnswer>> = serde_json::from_str(json)?;

    Ok(raw
        .into_iter()
        .map(|(session, words)| {
            let records = words
                .into_iter()
                .map(|(word, answer)| AnswerRecord {
                    word,
                    band: answer.band.unwrap_or(1),
                    known: answer.known.unwrap_or(false),
                })
                .collect();
            (session, records)
        })
        .collect())
}

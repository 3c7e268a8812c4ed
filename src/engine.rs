use std::collections::HashMap;

use tracing::{debug, info};

use crate::bands::BandLayout;
use crate::config::AssessmentConfig;
use crate::corpus::FrequencyCorpus;
use crate::error::{Result, VocabError};
use crate::estimator;
use crate::generator;
use crate::history::HistoryStore;
use crate::levels::{LevelScale, WordPool};
use crate::scoring;
use crate::types::{
    AdaptiveTestState, AssessmentResult, QuickTest, QuickTestWordItem, SessionAnswers, TestWord,
    UserHistory, VocabEstimate,
};

pub struct VocabAssessment {
    config: AssessmentConfig,
    layout: BandLayout,
    scale: LevelScale,
    corpus: FrequencyCorpus,
    pool: WordPool,
    history: HistoryStore,
}

impl VocabAssessment {
    pub fn new(config: AssessmentConfig) -> Result<Self> {
        config.validate()?;
        let corpus = FrequencyCorpus::from_path(&config.corpus_path);
        let pool = WordPool::load_or_seed(&config.word_pool_path())?;
        Self::with_parts(config, corpus, pool)
    }

    pub fn with_parts(config: AssessmentConfig, corpus: FrequencyCorpus, pool: WordPool) -> Result<Self> {
        config.validate()?;
        let scale = LevelScale::new(config.levels.clone())?;
        pool.check_coverage(&scale);

        let layout = BandLayout::from_config(&config.bands);
        let history = HistoryStore::new(config.user_results_dir(), scale.clone());
        info!(
            bands = layout.num_bands(),
            sessions = layout.sessions(),
            levels = scale.len(),
            data_dir = %config.data_dir.display(),
            "Assessment engine ready"
        );

        Ok(Self {
            config,
            layout,
            scale,
            corpus,
            pool,
            history,
        })
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn scale(&self) -> &LevelScale {
        &self.scale
    }

    pub fn corpus(&self) -> &FrequencyCorpus {
        &self.corpus
    }

    pub fn band_of_word(&self, word: &str) -> Option<u32> {
        self.corpus
            .rank_of(word)
            .map(|rank| self.layout.band_of(i64::from(rank)))
    }

    pub fn get_test_words(&self, session: u32) -> Result<Vec<TestWord>> {
        let max = self.layout.sessions();
        if session < 1 || session > max {
            return Err(VocabError::InvalidSession { session, max });
        }
        let words = self.layout.select_session_words(
            self.corpus.load(),
            session,
            self.config.bands.words_per_session,
        );
        debug!(session, words = words.len(), "Band test words");
        Ok(words)
    }

    pub fn calculate_vocab_size(&self, answers: &SessionAnswers) -> VocabEstimate {
        estimator::estimate(&self.layout, answers)
    }

    pub fn generate_quick_test(&self, num_words: usize) -> QuickTest {
        generator::generate_quick_test(&self.scale, &self.pool, num_words, &mut rand::thread_rng())
    }

    pub fn generate_adaptive_test(&self, initial_level: &str, max_questions: usize) -> Result<AdaptiveTestState> {
        generator::generate_adaptive_test(
            &self.scale,
            &self.pool,
            initial_level,
            max_questions,
            &mut rand::thread_rng(),
        )
    }

    pub fn next_adaptive_question(&self, state: &mut AdaptiveTestState, knew_previous: bool) -> Result<()> {
        generator::next_adaptive_question(&self.pool, state, knew_previous, &mut rand::thread_rng())
    }

    pub fn score_test(
        &self,
        words: &[QuickTestWordItem],
        test_id: u32,
        answers: &HashMap<String, bool>,
    ) -> AssessmentResult {
        scoring::score_test(&self.scale, words, test_id, answers)
    }

    pub fn score_quick_test(&self, test: &QuickTest, answers: &HashMap<String, bool>) -> AssessmentResult {
        self.score_test(&test.words, test.test_id, answers)
    }

    pub fn score_adaptive_test(
        &self,
        state: &AdaptiveTestState,
        answers: &HashMap<String, bool>,
    ) -> AssessmentResult {
        self.score_test(&state.words, state.test_id, answers)
    }

    pub fn save_result(&self, user_id: &str, result: AssessmentResult) -> Result<UserHistory> {
        self.history.save_result(user_id, result)
    }

    pub fn get_user_history(&self, user_id: &str) -> Result<UserHistory> {
        self.history.get_user_history(user_id)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub word: String,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestWord {
    pub word: String,
    pub rank: u32,
    pub band: u32,
}

fn default_band() -> u32 {
    1
}

// Missing band defaults to 1, missing known to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(default)]
    pub word: String,
    #[serde(default = "default_band")]
    pub band: u32,
    #[serde(default)]
    pub known: bool,
}

impl AnswerRecord {
    pub fn new(word: impl Into<String>, band: u32, known: bool) -> Self {
        Self {
            word: word.into(),
            band,
            known,
        }
    }
}

pub type SessionAnswers = BTreeMap<u32, Vec<AnswerRecord>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandStat {
    pub band: u32,
    pub tested: u32,
    pub known: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandResult {
    pub band: u32,
    pub range: String,
    pub start_rank: u32,
    pub end_rank: u32,
    pub tested: u32,
    pub known: u32,
    pub percentage: f64,
    pub estimated_known: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabEstimate {
    pub total_vocab_size: u32,
    pub band_results: Vec<BandResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickTestWordItem {
    pub word: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickTest {
    pub words: Vec<QuickTestWordItem>,
    pub distribution: Vec<LevelCount>,
    pub test_id: u32,
}

impl QuickTest {
    pub fn planned_count(&self, level: &str) -> Option<usize> {
        self.distribution
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveTestState {
    pub words: Vec<QuickTestWordItem>,
    pub current_level_idx: usize,
    pub levels: Vec<String>,
    pub max_questions: usize,
    pub next_question_index: usize,
    #[serde(default)]
    pub complete: bool,
    pub test_id: u32,
}

impl AdaptiveTestState {
    pub fn current_level(&self) -> Option<&str> {
        self.levels.get(self.current_level_idx).map(String::as_str)
    }

    pub fn next_question(&self) -> Option<&QuickTestWordItem> {
        if self.complete {
            return None;
        }
        self.words.get(self.next_question_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub vocabulary_size: u32,
    pub cefr_level: String,
    pub level_proportions: BTreeMap<String, f64>,
    pub confidence: u32,
    pub test_id: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserHistory {
    #[serde(default)]
    pub results: Vec<AssessmentResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_vocabulary_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cefr_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    Quick,
    Adaptive,
    Bands,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Initial,    // Waiting for Enter before the first word
    Asking,     // Showing a word, waiting for y/n
    Finished,   // Showing the result screen
}

#[derive(Debug, Clone)]
pub enum ActiveTest {
    Quick {
        test: QuickTest,
        position: usize,
    },
    Adaptive {
        state: AdaptiveTestState,
        position: usize,
    },
    Bands {
        session: u32,
        words: Vec<TestWord>,
        position: usize,
    },
}

#[derive(Debug)]
pub struct AppState {
    pub mode: AppMode,
    pub test_mode: TestMode,
    pub user_id: String,
    pub active: Option<ActiveTest>,
    pub answers: HashMap<String, bool>,
    pub band_answers: SessionAnswers,
    pub last_result: Option<AssessmentResult>,
    pub last_estimate: Option<VocabEstimate>,
    pub history: UserHistory,
    pub status: Option<String>,
}

impl AppState {
    pub fn new(test_mode: TestMode, user_id: String) -> Self {
        Self {
            mode: AppMode::Initial,
            test_mode,
            user_id,
            active: None,
            answers: HashMap::new(),
            band_answers: SessionAnswers::new(),
            last_result: None,
            last_estimate: None,
            history: UserHistory::default(),
            status: None,
        }
    }
}

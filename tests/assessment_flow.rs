//! End-to-end runs through the public engine against files on disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use vocab_assess::config::{load_config_from, AssessmentConfig};
use vocab_assess::estimator::parse_session_answers;
use vocab_assess::types::{AnswerRecord, SessionAnswers};
use vocab_assess::{VocabAssessment, VocabError};

fn write_corpus(path: &Path, words: usize) {
    let mut text = String::new();
    for i in 1..=words {
        text.push_str(&format!("word{i}\n"));
        if i % 50 == 0 {
            text.push('\n');
        }
    }
    fs::write(path, text).unwrap();
}

fn write_config(dir: &TempDir, total_words: u32) -> std::path::PathBuf {
    let config_path = dir.path().join("vocab_assess.toml");
    let text = format!(
        r#"
data_dir = "{data}"
corpus_path = "{corpus}"

[bands]
num_bands = 5
total_words = {total_words}
sessions = 2
words_per_session = 4

[quick]
num_words = 12
"#,
        data = dir.path().join("data").display(),
        corpus = dir.path().join("corpus.txt").display(),
    );
    fs::write(&config_path, text).unwrap();
    config_path
}

fn engine_from_files(total_words: u32, corpus_words: usize) -> (TempDir, VocabAssessment) {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir.path().join("corpus.txt"), corpus_words);
    let config_path = write_config(&dir, total_words);

    let config = load_config_from(Some(&config_path)).unwrap();
    let engine = VocabAssessment::new(config).unwrap();
    (dir, engine)
}

#[test]
fn band_test_from_config_and_corpus_files() {
    let (_dir, engine) = engine_from_files(200, 200);
    assert_eq!(engine.corpus().len(), 200);
    assert_eq!(engine.corpus().rank_of("word51"), Some(51));

    let first = engine.get_test_words(1).unwrap();
    let second = engine.get_test_words(2).unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(second.len(), 20);

    let first_words: Vec<&str> = first.iter().map(|w| w.word.as_str()).collect();
    assert!(second.iter().all(|w| !first_words.contains(&w.word.as_str())));

    let mut answers = SessionAnswers::new();
    answers.insert(
        1,
        first
            .iter()
            .map(|w| AnswerRecord::new(w.word.clone(), w.band, w.band <= 2))
            .collect(),
    );
    let estimate = engine.calculate_vocab_size(&answers);
    assert_eq!(estimate.total_vocab_size, 80);
    assert_eq!(estimate.band_results.len(), 5);
    assert_eq!(estimate.band_results[0].range, "1-40");
    assert_eq!(estimate.band_results[4].percentage, 0.0);

    assert!(matches!(
        engine.get_test_words(3),
        Err(VocabError::InvalidSession { session: 3, max: 2 })
    ));
}

#[test]
fn estimate_from_loose_json_payload() {
    let (_dir, engine) = engine_from_files(200, 200);
    let answers = parse_session_answers(
        r#"{
            "1": {"word1": {"band": 1, "known": true}, "word2": {"known": true}},
            "2": {"word90": {"band": 3}}
        }"#,
    )
    .unwrap();

    let estimate = engine.calculate_vocab_size(&answers);
    assert_eq!(estimate.band_results.len(), 2);
    assert_eq!(estimate.band_results[0].tested, 2);
    assert_eq!(estimate.band_results[0].estimated_known, 40);
    assert_eq!(estimate.band_results[1].band, 3);
    assert_eq!(estimate.total_vocab_size, 40);
}

#[test]
fn missing_corpus_gives_empty_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = AssessmentConfig {
        data_dir: dir.path().join("data"),
        corpus_path: dir.path().join("absent.txt"),
        ..AssessmentConfig::default()
    };
    let engine = VocabAssessment::new(config).unwrap();

    assert!(engine.corpus().is_empty());
    assert!(engine.get_test_words(1).unwrap().is_empty());
    assert_eq!(engine.calculate_vocab_size(&SessionAnswers::new()).total_vocab_size, 0);
}

#[test]
fn seeded_word_pool_is_reused_on_restart() {
    let (dir, engine) = engine_from_files(200, 10);
    let pool_path = engine.config().word_pool_path();
    assert!(pool_path.exists());
    drop(engine);

    // A hand-edited pool wins over the built-in sample.
    let mut pool: HashMap<String, Vec<String>> =
        serde_json::from_str(&fs::read_to_string(&pool_path).unwrap()).unwrap();
    pool.insert("A1".to_string(), vec!["zebra".to_string()]);
    fs::write(&pool_path, serde_json::to_string(&pool).unwrap()).unwrap();

    let config = load_config_from(Some(&dir.path().join("vocab_assess.toml"))).unwrap();
    let engine = VocabAssessment::new(config).unwrap();
    let test = engine.generate_quick_test(18);
    let a1: Vec<&str> = test
        .words
        .iter()
        .filter(|w| w.level == "A1")
        .map(|w| w.word.as_str())
        .collect();
    assert_eq!(a1, vec!["zebra"]);
    assert_eq!(test.planned_count("A1"), Some(3));
}

#[test]
fn quick_tests_build_a_rolling_history() {
    let (_dir, engine) = engine_from_files(200, 10);

    let mut last = None;
    for known_levels in [0usize, 2, 4, 6] {
        let test = engine.generate_quick_test(12);
        let labels = engine.scale().labels();
        let answers: HashMap<String, bool> = test
            .words
            .iter()
            .map(|w| {
                let idx = labels.iter().position(|l| *l == w.level).unwrap();
                (w.word.clone(), idx < known_levels)
            })
            .collect();
        let result = engine.score_quick_test(&test, &answers);
        last = Some(engine.save_result("reader-1", result).unwrap());
    }

    // Sizes 0, 1500, 7500, 31500: the average covers the last three only,
    // and their levels A2, C1, C2 average to B2.
    let history = last.unwrap();
    assert_eq!(history.results.len(), 4);
    assert_eq!(history.results[1].vocabulary_size, 1500);
    assert_eq!(history.average_vocabulary_size, Some(13_500));
    assert_eq!(history.average_cefr_level.as_deref(), Some("B2"));

    let reloaded = engine.get_user_history("reader-1").unwrap();
    assert_eq!(reloaded, history);
    assert!(reloaded.results.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn adaptive_test_runs_until_max_questions() {
    let (_dir, engine) = engine_from_files(200, 10);
    let mut state = engine.generate_adaptive_test("B1", 9).unwrap();
    assert_eq!(state.words.len(), 5);
    assert!(state.words.iter().all(|w| w.level == "B1"));

    let mut answers: HashMap<String, bool> =
        state.words.iter().map(|w| (w.word.clone(), true)).collect();
    while !state.complete {
        engine.next_adaptive_question(&mut state, true).unwrap();
        if let Some(item) = state.next_question() {
            answers.insert(item.word.clone(), true);
        }
    }

    assert_eq!(state.words.len(), 9);
    assert_eq!(state.current_level(), Some("C2"));
    assert!(matches!(
        engine.next_adaptive_question(&mut state, true),
        Err(VocabError::TestComplete(_))
    ));

    let result = engine.score_adaptive_test(&state, &answers);
    assert_eq!(result.test_id, state.test_id);
    assert_eq!(result.level_proportions["B1"], 1.0);
    assert_eq!(result.level_proportions["A1"], 0.0);
}

#[test]
fn user_ids_cannot_escape_the_results_dir() {
    let (_dir, engine) = engine_from_files(200, 10);
    for bad in ["", "..", "../evil", "a/b"] {
        assert!(matches!(
            engine.get_user_history(bad),
            Err(VocabError::InvalidUserId(_))
        ));
    }
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_config_from(Some(&missing)),
        Err(VocabError::InvalidConfig(_))
    ));
}

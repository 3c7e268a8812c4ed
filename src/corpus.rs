use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, error, warn};

use crate::types::FrequencyEntry;

#[derive(Debug)]
enum Source {
    File(PathBuf),
    Words(Vec<String>),
}

// Read on first load() and cached; a missing file gives an empty corpus.
#[derive(Debug)]
pub struct FrequencyCorpus {
    source: Source,
    entries: OnceLock<Vec<FrequencyEntry>>,
}

impl FrequencyCorpus {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            entries: OnceLock::new(),
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: Source::Words(words.into_iter().map(Into::into).collect()),
            entries: OnceLock::new(),
        }
    }

    pub fn load(&self) -> &[FrequencyEntry] {
        self.entries.get_or_init(|| match &self.source {
            Source::File(path) => read_corpus_file(path),
            Source::Words(words) => rank_lines(words.iter().map(String::as_str)),
        })
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    pub fn rank_of(&self, word: &str) -> Option<u32> {
        self.load()
            .iter()
            .find(|entry| entry.word == word)
            .map(|entry| entry.rank)
    }
}

fn read_corpus_file(path: &Path) -> Vec<FrequencyEntry> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let entries = rank_lines(text.lines());
            debug!(path = %path.display(), words = entries.len(), "Loaded frequency corpus");
            entries
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Frequency corpus not found, band tests will be empty");
            Vec::new()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read frequency corpus");
            Vec::new()
        }
    }
}

// Blank lines do not consume a rank.
fn rank_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<FrequencyEntry> {
    lines
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .enumerate()
        .map(|(i, word)| FrequencyEntry {
            word: word.to_string(),
            rank: i as u32 + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_one_based_and_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "the\n\n  of \nand\n\n").unwrap();

        let corpus = FrequencyCorpus::from_path(&path);
        let entries = corpus.load();
        assert_eq!(
            entries,
            [
                FrequencyEntry { word: "the".into(), rank: 1 },
                FrequencyEntry { word: "of".into(), rank: 2 },
                FrequencyEntry { word: "and".into(), rank: 3 },
            ]
        );
    }

    #[test]
    fn load_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "alpha\nbeta\n").unwrap();

        let corpus = FrequencyCorpus::from_path(&path);
        let first = corpus.load().to_vec();

        // Changing the file after the first load must not be observed.
        fs::write(&path, "gamma\n").unwrap();
        let second = corpus.load();
        assert_eq!(first, second);
        assert!(std::ptr::eq(corpus.load(), second));
    }

    #[test]
    fn missing_file_is_empty() {
        let corpus = FrequencyCorpus::from_path("/no/such/corpus.txt");
        assert!(corpus.is_empty());
        assert_eq!(corpus.rank_of("the"), None);
    }

    #[test]
    fn rank_lookup() {
        let corpus = FrequencyCorpus::from_words(["the", "of", "and"]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.rank_of("and"), Some(3));
        assert_eq!(corpus.rank_of("zebra"), None);
    }
}

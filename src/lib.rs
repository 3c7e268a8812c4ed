//! Vocabulary size assessment.
//!
//! Two independent ways of estimating how many words someone knows:
//!
//! - a frequency-band test over a ranked corpus, extrapolated band by band
//!   ([`bands`], [`estimator`]);
//! - quick and adaptive tests over per-level word pools, scored against a
//!   CEFR-style scale and kept in a per-user history ([`generator`],
//!   [`scoring`], [`history`]).
//!
//! [`VocabAssessment`] bundles both behind one handle.

pub mod app;
pub mod bands;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod generator;
pub mod history;
pub mod levels;
pub mod scoring;
pub mod types;

pub use engine::VocabAssessment;
pub use error::{Result, VocabError};

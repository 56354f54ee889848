#![allow(clippy::missing_errors_doc)]
pub mod caption;
pub mod chat;
pub mod config;
pub mod corpus;
pub mod diary;
pub mod error;
pub mod onnx;
pub mod report;
pub mod scorer;
pub mod stats;
pub mod translate;
pub mod utils;

pub use chat::{ChatClient, TextGenerator};
pub use corpus::{Corpus, CorpusRecord, HumanLabel};
pub use error::{DiaryError, Result};
pub use scorer::{BertScorer, ScoreSet};
pub use stats::ScoreSummary;
pub use translate::Translator;

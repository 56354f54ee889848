use crate::corpus::{Corpus, HumanLabel};
use crate::error::{DiaryError, Result};
use crate::scorer::ScoreSet;

/// Corpus-wide aggregate BERTScore statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub mean_precision: f32,
    pub mean_recall: f32,
    pub mean_f1: f32,
    /// Mean F1 over records a human judged as matching ("O").
    pub mean_f1_match: f32,
    /// Mean F1 over records a human judged as not matching ("X").
    pub mean_f1_no_match: f32,
}

/// Unweighted arithmetic mean. An empty slice is an error, never NaN.
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f32], what: &'static str) -> Result<f32> {
    if values.is_empty() {
        return Err(DiaryError::EmptyAggregate(what));
    }
    Ok(values.iter().sum::<f32>() / values.len() as f32)
}

/// Aggregate the per-record scores, including the human-label breakdown.
pub fn summarize(corpus: &Corpus, scores: &ScoreSet) -> Result<ScoreSummary> {
    let f1_for = |label: HumanLabel| -> Vec<f32> {
        corpus
            .records
            .iter()
            .zip(&scores.f1)
            .filter(|(record, _)| record.label() == label)
            .map(|(_, &f1)| f1)
            .collect()
    };
    let match_f1 = f1_for(HumanLabel::Match);
    let no_match_f1 = f1_for(HumanLabel::NoMatch);

    Ok(ScoreSummary {
        mean_precision: mean(&scores.precision, "precision")?,
        mean_recall: mean(&scores.recall, "recall")?,
        mean_f1: mean(&scores.f1, "F1")?,
        mean_f1_match: mean(&match_f1, "human-label O")?,
        mean_f1_no_match: mean(&no_match_f1, "human-label X")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusRecord;

    fn record(judgment: &str) -> CorpusRecord {
        CorpusRecord {
            image_id: "img.jpg".to_string(),
            caption: "caption".to_string(),
            keyword: "keyword".to_string(),
            judgment: judgment.to_string(),
            translated_caption: None,
        }
    }

    #[test]
    fn mean_of_empty_slice_is_an_error() {
        let err = mean(&[], "F1").unwrap_err();
        assert!(matches!(err, DiaryError::EmptyAggregate("F1")));
    }

    #[test]
    fn label_conditioned_means() {
        let corpus = Corpus {
            records: vec![record("O"), record("O"), record("X")],
            skipped: 0,
        };
        let scores = ScoreSet {
            precision: vec![0.9, 0.7, 0.3],
            recall: vec![0.8, 0.5, 0.2],
            f1: vec![0.8, 0.6, 0.2],
        };
        let summary = summarize(&corpus, &scores).unwrap();
        assert!((summary.mean_f1 - 0.5333333).abs() < 1e-3);
        assert!((summary.mean_f1_match - 0.7).abs() < 1e-6);
        assert!((summary.mean_f1_no_match - 0.2).abs() < 1e-6);
    }

    #[test]
    fn missing_label_bucket_is_an_error() {
        let corpus = Corpus {
            records: vec![record("O")],
            skipped: 0,
        };
        let scores = ScoreSet {
            precision: vec![0.9],
            recall: vec![0.8],
            f1: vec![0.8],
        };
        let err = summarize(&corpus, &scores).unwrap_err();
        assert!(matches!(err, DiaryError::EmptyAggregate("human-label X")));
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let corpus = Corpus::default();
        let scores = ScoreSet::default();
        assert!(summarize(&corpus, &scores).is_err());
    }
}

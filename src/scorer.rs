use crate::config::ScorerConfig;
use crate::error::{DiaryError, Result};
use crate::onnx::OnnxSession;
use crate::utils;
use ndarray::{Array2, ArrayView2, Axis};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::debug;

/// Per-record BERTScore results, aligned with the scorer's input order.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    pub precision: Vec<f32>,
    pub recall: Vec<f32>,
    pub f1: Vec<f32>,
}

impl ScoreSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.f1.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.f1.is_empty()
    }
}

/// BERTScore over a local ONNX BERT encoder.
///
/// Candidate and reference texts are embedded token-by-token, then matched
/// greedily by cosine similarity: precision averages each candidate token's
/// best match, recall averages each reference token's best match, and F1 is
/// their harmonic mean.
pub struct BertScorer {
    session: OnnxSession,
    config: ScorerConfig,
    tokenizer: Tokenizer,
}

impl BertScorer {
    /// Load the scorer from a directory holding `model.onnx`,
    /// `tokenizer.json`, and `scorer_config.json`.
    pub fn new(model_dir: &Path) -> Result<Self> {
        utils::verify_model_dir(model_dir)?;

        let config = ScorerConfig::from_file(model_dir.join("scorer_config.json"))?;
        let session = OnnxSession::new(model_dir.join("model.onnx"))?;
        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| DiaryError::Tokenizer(e.to_string()))?;

        let pad_id = tokenizer
            .get_vocab(true)
            .get("[PAD]")
            .copied()
            .ok_or_else(|| DiaryError::Config("No [PAD] token found in tokenizer".into()))?;

        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                pad_id,
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| DiaryError::Tokenizer(e.to_string()))?;

        Ok(Self {
            session,
            config,
            tokenizer,
        })
    }

    /// Score each (candidate, reference) pair. All-or-nothing: the first
    /// failure propagates and no partial results are returned.
    pub fn score<T: AsRef<str>>(
        &mut self,
        candidates: &[T],
        references: &[T],
    ) -> Result<ScoreSet> {
        if candidates.len() != references.len() {
            return Err(DiaryError::Inference(format!(
                "candidate count {} does not match reference count {}",
                candidates.len(),
                references.len()
            )));
        }

        let candidate_embs = self.embed_tokens(candidates)?;
        let reference_embs = self.embed_tokens(references)?;

        let mut scores = ScoreSet::default();
        for (cand, refer) in candidate_embs.iter().zip(&reference_embs) {
            let (p, r, f1) = greedy_match(cand.view(), refer.view());
            scores.precision.push(p);
            scores.recall.push(r);
            scores.f1.push(f1);
        }
        Ok(scores)
    }

    /// Embed every text into a (tokens, hidden) matrix of L2-normalized
    /// contextual token embeddings, special tokens and padding excluded.
    fn embed_tokens<T: AsRef<str>>(&mut self, texts: &[T]) -> Result<Vec<Array2<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            self.embed_chunk(chunk, &mut embeddings)?;
        }
        Ok(embeddings)
    }

    fn embed_chunk<T: AsRef<str>>(
        &mut self,
        texts: &[T],
        out: &mut Vec<Array2<f32>>,
    ) -> Result<()> {
        if texts.is_empty() {
            return Ok(());
        }

        let encodings = if self.config.lowercase {
            let lowered = texts.iter().map(|s| s.as_ref().to_lowercase()).collect();
            self.tokenizer.encode_batch(lowered, true)
        } else {
            let texts: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
            self.tokenizer.encode_batch(texts, true)
        }
        .map_err(|e| DiaryError::Tokenizer(e.to_string()))?;

        let batch_size = encodings.len();
        let seq_len = encodings[0].get_ids().len();
        debug!(batch_size, seq_len, "running scorer encoder");

        let ids: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_ids().iter().map(|&x| i64::from(x)))
            .collect();
        let mask: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().iter().map(|&x| i64::from(x)))
            .collect();

        let ids_array = Array2::from_shape_vec((batch_size, seq_len), ids)
            .map_err(|e| DiaryError::Inference(e.to_string()))?;
        let mask_array = Array2::from_shape_vec((batch_size, seq_len), mask)
            .map_err(|e| DiaryError::Inference(e.to_string()))?;

        let hidden = self.session.encode(ids_array, mask_array)?;

        for (i, encoding) in encodings.iter().enumerate() {
            let real_tokens: usize = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as usize)
                .sum();
            // Drop [CLS] and [SEP]; padding falls outside `real_tokens`.
            let start = real_tokens.min(1);
            let end = real_tokens.saturating_sub(1).max(start);
            let mut token_embs = hidden
                .index_axis(Axis(0), i)
                .slice(ndarray::s![start..end, ..])
                .to_owned();
            normalize_rows(&mut token_embs);
            out.push(token_embs);
        }
        Ok(())
    }
}

/// L2-normalize each row in place. Zero rows are left untouched.
fn normalize_rows(matrix: &mut Array2<f32>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

/// Greedy cosine matching over normalized token embeddings.
///
/// Returns (precision, recall, f1). A side with no tokens scores 0.0, and F1
/// is 0.0 when precision and recall are both 0.0.
#[must_use]
pub fn greedy_match(candidate: ArrayView2<f32>, reference: ArrayView2<f32>) -> (f32, f32, f32) {
    if candidate.nrows() == 0 || reference.nrows() == 0 {
        return (0.0, 0.0, 0.0);
    }

    let sim = candidate.dot(&reference.t());
    let precision = sim
        .map_axis(Axis(1), |row| row.fold(f32::NEG_INFINITY, |a, &b| a.max(b)))
        .mean()
        .unwrap_or(0.0);
    let recall = sim
        .map_axis(Axis(0), |col| col.fold(f32::NEG_INFINITY, |a, &b| a.max(b)))
        .mean()
        .unwrap_or(0.0);

    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    (precision, recall, f1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn identical_tokens_score_one() {
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let (p, r, f1) = greedy_match(a.view(), a.view());
        assert!((p - 1.0).abs() < 1e-6);
        assert!((r - 1.0).abs() < 1e-6);
        assert!((f1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_tokens_score_zero() {
        let a = array![[1.0, 0.0]];
        let b = array![[0.0, 1.0]];
        let (p, r, f1) = greedy_match(a.view(), b.view());
        assert!(p.abs() < 1e-6);
        assert!(r.abs() < 1e-6);
        assert!(f1.abs() < 1e-6);
    }

    #[test]
    fn precision_and_recall_diverge_on_asymmetric_overlap() {
        // Both candidate tokens match the single reference token exactly, but
        // the reference also has an unmatched direction.
        let candidate = array![[1.0, 0.0], [1.0, 0.0]];
        let reference = array![[1.0, 0.0], [0.0, 1.0]];
        let (p, r, f1) = greedy_match(candidate.view(), reference.view());
        assert!((p - 1.0).abs() < 1e-6);
        assert!((r - 0.5).abs() < 1e-6);
        assert!((f1 - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn empty_side_scores_zero() {
        let empty = Array2::<f32>::zeros((0, 4));
        let full = array![[1.0, 0.0, 0.0, 0.0]];
        assert_eq!(greedy_match(empty.view(), full.view()), (0.0, 0.0, 0.0));
    }

    #[test]
    fn normalize_rows_produces_unit_vectors() {
        let mut m = array![[3.0, 4.0], [0.0, 0.0]];
        normalize_rows(&mut m);
        assert!((m[[0, 0]] - 0.6).abs() < 1e-6);
        assert!((m[[0, 1]] - 0.8).abs() < 1e-6);
        assert_eq!(m[[1, 0]], 0.0);
    }
}

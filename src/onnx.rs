use crate::error::{DiaryError, Result};
use ndarray::{Array3, ArrayView, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;

/// Thin wrapper around an `ort` session for transformer encoder models.
pub struct OnnxSession {
    pub session: Session,
    id_name: String,
    mask_name: String,
    type_name: Option<String>,
}

impl OnnxSession {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let threads = num_cpus::get();
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)?;

        let id_name = find_input(&session, &["input_ids"])
            .ok_or_else(|| DiaryError::Config("Could not find token-id input node".into()))?;
        let mask_name = find_input(&session, &["attention_mask"])
            .ok_or_else(|| DiaryError::Config("Could not find attention-mask input node".into()))?;
        // Some BERT exports drop the segment input entirely.
        let type_name = find_input(&session, &["token_type_ids", "segment_ids"]);

        Ok(Self {
            session,
            id_name,
            mask_name,
            type_name,
        })
    }

    /// Run the encoder over a tokenized batch and return the hidden states as
    /// a (batch, seq, hidden) array.
    pub fn encode(
        &mut self,
        ids: ndarray::Array2<i64>,
        mask: ndarray::Array2<i64>,
    ) -> Result<Array3<f32>> {
        let (batch, seq) = ids.dim();
        let ort_ids = Value::from_array(ids)?;
        let ort_mask = Value::from_array(mask)?;

        let outputs = if let Some(t_name) = &self.type_name {
            let zeros = ndarray::Array2::<i64>::zeros((batch, seq));
            let ort_types = Value::from_array(zeros)?;
            self.session.run(ort::inputs![
                &self.id_name => ort_ids,
                &self.mask_name => ort_mask,
                t_name => ort_types
            ])?
        } else {
            self.session.run(ort::inputs![
                &self.id_name => ort_ids,
                &self.mask_name => ort_mask
            ])?
        };

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shape_usize: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        let view = ArrayView::from_shape(IxDyn(&shape_usize), data)
            .map_err(|e| DiaryError::Inference(e.to_string()))?;
        Ok(view
            .into_dimensionality::<ndarray::Ix3>()
            .map_err(|e| DiaryError::Inference(e.to_string()))?
            .to_owned())
    }
}

/// Find the first input name the model actually has for a specific role.
fn find_input(session: &Session, possibilities: &[&str]) -> Option<String> {
    for &p in possibilities {
        if session.inputs().iter().any(|i| i.name() == p) {
            return Some(p.to_string());
        }
    }
    None
}

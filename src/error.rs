use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiaryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ONNX error: {0}")]
    Onnx(#[from] ort::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Tokenization error: {0}")]
    Tokenizer(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Chat API error: {0}")]
    Chat(String),
    #[error("Corpus file not found: {}", .0.display())]
    CorpusNotFound(PathBuf),
    #[error("Scorer model folder not found: {}", .0.display())]
    ModelFolderNotFound(PathBuf),
    #[error("Missing scorer model file '{file}' in {}", .model_dir.display())]
    MissingModelFile { model_dir: PathBuf, file: String },
    #[error("Cannot average an empty set of {0} values")]
    EmptyAggregate(&'static str),
}

impl From<ort::Error<ort::session::builder::SessionBuilder>> for DiaryError {
    fn from(e: ort::Error<ort::session::builder::SessionBuilder>) -> Self {
        DiaryError::Onnx(e.into())
    }
}

pub type Result<T> = std::result::Result<T, DiaryError>;

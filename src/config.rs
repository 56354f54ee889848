use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings for the BERTScore encoder, stored as `scorer_config.json` next to
/// the exported `model.onnx` and `tokenizer.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerConfig {
    /// Maximum token length per text; longer inputs are truncated.
    pub max_length: usize,
    /// How many texts to run through the encoder per session call.
    pub batch_size: usize,
    /// Whether the tokenizer expects lowercased input.
    #[serde(default)]
    pub lowercase: bool,
}

impl ScorerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

/// Connection settings for the hosted chat-completions API used for
/// translation, captioning, and diary generation.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            // Low temperature keeps the output factual.
            temperature: 0.3,
            max_tokens: 1000,
            timeout_secs: 120,
        }
    }
}

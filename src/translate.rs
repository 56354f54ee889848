use crate::chat::TextGenerator;
use tracing::warn;

const TRANSLATOR_PERSONA: &str =
    "You are a translation engine. Reply with the translation only, no commentary.";

/// Machine translation over an injected text-generation handle.
///
/// One API call per item, no batching, no retries. A failed item falls back
/// to its original text, so the output always has the input's length and
/// order.
pub struct Translator<G> {
    generator: G,
    target_lang: String,
}

impl<G: TextGenerator> Translator<G> {
    pub fn new(generator: G, target_lang: impl Into<String>) -> Self {
        Self {
            generator,
            target_lang: target_lang.into(),
        }
    }

    pub fn translate_all<T: AsRef<str>>(&self, texts: &[T]) -> Vec<String> {
        texts
            .iter()
            .map(|text| self.translate_one(text.as_ref()))
            .collect()
    }

    fn translate_one(&self, text: &str) -> String {
        let prompt = format!(
            "Translate the following text into {}:\n\n{}",
            self.target_lang, text
        );
        match self.generator.complete(TRANSLATOR_PERSONA, &prompt) {
            Ok(translated) => translated.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "translation failed, keeping original text");
                text.to_string()
            }
        }
    }
}

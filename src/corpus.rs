use crate::error::{DiaryError, Result};
use std::fs;
use std::path::Path;

/// Binary human judgment of whether a caption matches its keyword.
///
/// The corpus file marks a match with `"O"` and a non-match with `"X"`;
/// anything else lands in the non-match bucket, mirroring how the judgments
/// were collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanLabel {
    Match,
    NoMatch,
}

/// One surviving line of the corpus file.
#[derive(Debug, Clone)]
pub struct CorpusRecord {
    pub image_id: String,
    pub caption: String,
    pub keyword: String,
    /// Raw judgment mark as written in the file ("O" or "X").
    pub judgment: String,
    pub translated_caption: Option<String>,
}

impl CorpusRecord {
    #[must_use]
    pub fn label(&self) -> HumanLabel {
        if self.judgment == "O" {
            HumanLabel::Match
        } else {
            HumanLabel::NoMatch
        }
    }
}

/// Parsed caption/keyword corpus with aligned records.
///
/// Lines that do not match `<image> : <caption> / <keyword> / <label>` are
/// dropped whole, so every per-record sequence derived from the corpus stays
/// the same length. `skipped` counts the dropped lines.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub records: Vec<CorpusRecord>,
    pub skipped: usize,
}

impl Corpus {
    /// Load a corpus file. Each line must match
    /// `<image_id> : <caption> / <keyword> / <label>` with literal `" : "`
    /// and `" / "` delimiters; non-matching lines are skipped silently.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DiaryError::CorpusNotFound(path.to_owned()));
        }

        let text = fs::read_to_string(path)?;
        let mut records = Vec::new();
        let mut skipped = 0;

        for line in text.lines() {
            let line = line.trim();
            let parts: Vec<&str> = line.split(" : ").collect();
            if parts.len() != 2 {
                skipped += 1;
                continue;
            }
            let fields: Vec<&str> = parts[1].split(" / ").collect();
            if fields.len() != 3 {
                skipped += 1;
                continue;
            }
            records.push(CorpusRecord {
                image_id: parts[0].to_string(),
                caption: fields[0].to_string(),
                keyword: fields[1].to_string(),
                judgment: fields[2].to_string(),
                translated_caption: None,
            });
        }

        Ok(Self { records, skipped })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Captions as loaded from the file.
    #[must_use]
    pub fn captions(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.caption.as_str()).collect()
    }

    /// Reference keyword phrases.
    #[must_use]
    pub fn keywords(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.keyword.as_str()).collect()
    }

    /// Captions to feed the scorer: the translated variant where the
    /// translation stage ran, the original otherwise.
    #[must_use]
    pub fn scoring_captions(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.translated_caption.as_deref().unwrap_or(&r.caption))
            .collect()
    }

    /// Attach a translated caption to each record, in order.
    pub fn apply_translations(&mut self, translations: Vec<String>) -> Result<()> {
        if translations.len() != self.records.len() {
            return Err(DiaryError::Inference(format!(
                "translation count {} does not match record count {}",
                translations.len(),
                self.records.len()
            )));
        }
        for (record, translated) in self.records.iter_mut().zip(translations) {
            record.translated_caption = Some(translated);
        }
        Ok(())
    }

    /// Number of records a human judged as matching.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.label() == HumanLabel::Match)
            .count()
    }
}

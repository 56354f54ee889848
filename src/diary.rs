use crate::chat::TextGenerator;
use crate::error::Result;
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const WRITER_PERSONA: &str =
    "You are a writer who objectively describes the situations shown in photographs.";

const GUIDELINES: &str = "\n**Writing guidelines**:\n\
1. **The diary's narrator is \"I\"**; mention the people who were there where it fits.\n\
2. **Actively use the caption, place, people, and activity keywords** so the entry reads like a record of real experience.\n\
3. **Add emotional color** so the entry is easy to get absorbed in.\n\
4. **Treat the photo order as chronological** and write the entry in that order. (If a daytime photo follows a nighttime one, treat it as the next day.)\n\
5. **Use only the information given** and keep the entry factual.";

/// One photo plus the user-supplied context around it.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoEntry {
    pub image: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub person: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub keywords: String,
}

/// Input for one diary run: photos in the order they were taken, plus an
/// optional overall mood.
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryManifest {
    pub photos: Vec<PhotoEntry>,
    #[serde(default)]
    pub mood: Option<String>,
}

impl DiaryManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }
}

/// Build the diary prompt from the photo entries and optional mood.
#[must_use]
pub fn build_prompt(entries: &[PhotoEntry], mood: Option<&str>) -> String {
    let mut prompt = String::from(
        "Write a diary entry based on the photos taken today.\n\
         Each photo comes with an AI-generated caption plus the place, the people present, and activity keywords.\n\
         Use this information naturally and describe only things that actually happened.\n\n\
         **Photo information** (write in this order):\n",
    );

    for (i, entry) in entries.iter().enumerate() {
        let location = if entry.location.is_empty() {
            "somewhere"
        } else {
            entry.location.as_str()
        };
        let _ = write!(
            prompt,
            "Photo {}\n- AI caption: {}\n  Place: {}\n  People: {}\n  Keywords: {}\n\n",
            i + 1,
            entry.caption,
            location,
            entry.person,
            entry.keywords,
        );
    }

    prompt.push_str(GUIDELINES);
    if let Some(mood) = mood.map(str::trim).filter(|m| !m.is_empty()) {
        let _ = write!(
            prompt,
            "\n6. **Match the requested mood**. Requested mood: \"{mood}\""
        );
    }
    prompt
}

/// Generate the diary text for a manifest.
pub fn write_diary<G: TextGenerator>(generator: &G, manifest: &DiaryManifest) -> Result<String> {
    let prompt = build_prompt(&manifest.photos, manifest.mood.as_deref());
    generator.complete(WRITER_PERSONA, &prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(caption: &str, location: &str) -> PhotoEntry {
        PhotoEntry {
            image: "photo.jpg".to_string(),
            caption: caption.to_string(),
            person: "Min-ji".to_string(),
            location: location.to_string(),
            keywords: "picnic".to_string(),
        }
    }

    #[test]
    fn prompt_lists_photos_in_order() {
        let prompt = build_prompt(
            &[entry("first photo", "park"), entry("second photo", "cafe")],
            None,
        );
        let first = prompt.find("Photo 1").unwrap();
        let second = prompt.find("Photo 2").unwrap();
        assert!(first < second);
        assert!(prompt.contains("AI caption: first photo"));
        assert!(prompt.contains("Place: cafe"));
    }

    #[test]
    fn empty_location_falls_back_to_somewhere() {
        let prompt = build_prompt(&[entry("a photo", "")], None);
        assert!(prompt.contains("Place: somewhere"));
    }

    #[test]
    fn mood_guideline_only_appears_when_given() {
        let without = build_prompt(&[entry("a photo", "park")], None);
        assert!(!without.contains("Requested mood"));
        assert!(!build_prompt(&[entry("a", "b")], Some("   ")).contains("Requested mood"));

        let with = build_prompt(&[entry("a photo", "park")], Some("wistful"));
        assert!(with.contains("Requested mood: \"wistful\""));
        assert!(with.contains("6. **Match the requested mood**"));
    }

    #[test]
    fn manifest_defaults_optional_fields() {
        let json = r#"{ "photos": [ { "image": "a.jpg" } ] }"#;
        let manifest: DiaryManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.photos.len(), 1);
        assert_eq!(manifest.photos[0].caption, "");
        assert!(manifest.mood.is_none());
    }
}

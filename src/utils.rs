use crate::error::{DiaryError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Files every scorer model directory must contain.
pub const SCORER_FILES: &[&str] = &["model.onnx", "tokenizer.json", "scorer_config.json"];

/// Default directory where scorer model files are cached for a given model ID.
#[must_use]
pub fn default_model_dir(model_id: &str) -> PathBuf {
    let base_folder = env::home_dir().map_or_else(
        || Path::new(".photo_diary_cache").to_owned(),
        |p| p.join(".cache/photo_diary"),
    );
    base_folder.join(model_id)
}

/// Verify that a scorer model directory exists and contains the right files.
pub fn verify_model_dir(model_dir: &Path) -> Result<()> {
    if !model_dir.exists() {
        return Err(DiaryError::ModelFolderNotFound(model_dir.to_owned()));
    }

    for file in SCORER_FILES {
        let path = model_dir.join(file);
        if !path.is_file() {
            return Err(DiaryError::MissingModelFile {
                model_dir: model_dir.to_owned(),
                file: (*file).to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dir_is_reported() {
        let err = verify_model_dir(Path::new("/no/such/model")).unwrap_err();
        assert!(matches!(err, DiaryError::ModelFolderNotFound(_)));
    }

    #[test]
    fn incomplete_dir_names_the_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"").unwrap();
        let err = verify_model_dir(dir.path()).unwrap_err();
        match err {
            DiaryError::MissingModelFile { file, .. } => assert_eq!(file, "tokenizer.json"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

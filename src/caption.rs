use crate::chat::ChatClient;
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

const CAPTIONER_PERSONA: &str =
    "You describe the content of photographs in one short, factual sentence.";
const CAPTION_INSTRUCTION: &str =
    "Write a one-sentence caption describing what is happening in this photo.";

/// Re-encode an image as RGB JPEG and wrap it in a base64 data URI suitable
/// for the chat API's `image_url` content part.
pub fn image_data_uri(path: &Path) -> Result<String> {
    let rgb = image::open(path)?.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(buffer.into_inner())
    ))
}

/// Caption each image via the vision-capable chat model, one call per image,
/// preserving order. Any failure aborts the run; captioning has no fallback
/// text.
pub fn caption_images(client: &ChatClient, paths: &[PathBuf]) -> Result<Vec<String>> {
    // Decoding and re-encoding is the expensive local step, so do it for the
    // whole batch up front.
    let uris = paths
        .par_iter()
        .map(|path| image_data_uri(path))
        .collect::<Result<Vec<_>>>()?;

    let mut captions = Vec::with_capacity(uris.len());
    for (path, uri) in paths.iter().zip(uris) {
        debug!(image = %path.display(), "requesting caption");
        let caption = client.complete_with_images(
            CAPTIONER_PERSONA,
            CAPTION_INSTRUCTION,
            std::slice::from_ref(&uri),
        )?;
        captions.push(caption.trim().to_string());
    }
    Ok(captions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn data_uri_has_jpeg_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::new(2, 2).save(&path).unwrap();

        let uri = image_data_uri(&path).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        // JPEG magic bytes survive the round trip.
        let payload = STANDARD
            .decode(uri.trim_start_matches("data:image/jpeg;base64,"))
            .unwrap();
        assert_eq!(&payload[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn unreadable_image_is_an_error() {
        assert!(image_data_uri(Path::new("/no/such/photo.jpg")).is_err());
    }
}

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;

/// Encode raw image bytes as a `data:` URL.
pub fn encode_image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read an image file and encode it, guessing the MIME type from its extension.
pub fn image_data_url_from_path(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mime = guess_image_mime(path)
        .ok_or_else(|| anyhow::anyhow!("Unsupported image type: {}", path.display()))?;
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        anyhow::bail!("Image file is empty: {}", path.display());
    }
    Ok(encode_image_data_url(mime, &bytes))
}

fn guess_image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_data_url() {
        assert_eq!(
            encode_image_data_url("image/png", b"hello"),
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn reads_file_with_guessed_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.JPG");
        fs::write(&path, [0xFFu8, 0xD8, 0xFF]).unwrap();

        let url = image_data_url_from_path(&path).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn rejects_unknown_extension_and_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "x").unwrap();
        assert!(image_data_url_from_path(&txt).is_err());

        let empty = dir.path().join("empty.png");
        fs::write(&empty, b"").unwrap();
        assert!(image_data_url_from_path(&empty).is_err());
    }
}

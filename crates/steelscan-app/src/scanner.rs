//! Image scanning and payload loading

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use steelscan_types::{Error, ImagePayload, Result};
use tracing::debug;
use walkdir::WalkDir;

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a directory for image files
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    // Sort by filename for consistent ordering
    images.sort_by(|a, b| {
        a.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .cmp(b.file_name().and_then(|n| n.to_str()).unwrap_or(""))
    });

    Ok(images)
}

/// Expand files and directories into image files, keeping argument order
pub fn scan_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            images.extend(scan_directory(path)?);
        } else if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        } else if is_supported_image(path) {
            images.push(path.clone());
        } else {
            return Err(Error::InvalidImageFormat(format!(
                "Unsupported image format: {}",
                path.display()
            )));
        }
    }

    debug!(count = images.len(), "images scanned");
    Ok(images)
}

/// Read an image file into a `data:` URL payload
pub fn load_payload(path: &Path) -> Result<ImagePayload> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes)
        .map_err(|_| Error::InvalidImageFormat(path.display().to_string()))?;

    Ok(ImagePayload::from_base64(
        format.to_mime_type(),
        &STANDARD.encode(&bytes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_png(path: &Path) {
        image::RgbImage::new(2, 2)
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.webp")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_scan_paths_sorts_directories() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("b.png"));
        write_png(&dir.path().join("a.png"));
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let single = dir.path().join("c.png");
        write_png(&single);

        let images = scan_paths(&[single.clone(), dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["c.png", "a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_scan_paths_missing_and_unsupported() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.jpg");
        assert!(matches!(scan_paths(&[missing]), Err(Error::FileNotFound(_))));

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "x").unwrap();
        assert!(matches!(
            scan_paths(&[text]),
            Err(Error::InvalidImageFormat(_))
        ));
    }

    #[test]
    fn test_load_payload_sniffs_format() {
        let dir = tempdir().unwrap();
        // Extension lies; content decides the mime type
        let path = dir.path().join("photo.jpg");
        write_png(&path);

        let payload = load_payload(&path).unwrap();
        assert_eq!(payload.mime_type(), "image/png");
        assert!(payload.as_str().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_load_payload_rejects_non_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, "not an image").unwrap();
        assert!(matches!(
            load_payload(&path),
            Err(Error::InvalidImageFormat(_))
        ));
    }
}

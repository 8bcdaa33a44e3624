//! Preview classification
//!
//! One pure function maps a MIME type to a closed set of preview kinds;
//! rendering decisions downstream branch on the variant, resolved once
//! per download.

/// How a decrypted file can be previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Pdf,
    Text,
    Unsupported,
}

/// Classify a MIME type. Parameters (`; charset=...`) are ignored.
pub fn classify_preview(mime_type: &str) -> PreviewKind {
    let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();

    if essence.starts_with("image/") {
        PreviewKind::Image
    } else if essence == "application/pdf" {
        PreviewKind::Pdf
    } else if essence.starts_with("text/") {
        PreviewKind::Text
    } else {
        PreviewKind::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_images() {
        assert_eq!(classify_preview("image/png"), PreviewKind::Image);
        assert_eq!(classify_preview("image/jpeg"), PreviewKind::Image);
        assert_eq!(classify_preview("image/svg+xml"), PreviewKind::Image);
    }

    #[test]
    fn test_classify_pdf() {
        assert_eq!(classify_preview("application/pdf"), PreviewKind::Pdf);
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(classify_preview("text/plain"), PreviewKind::Text);
        assert_eq!(classify_preview("text/html"), PreviewKind::Text);
    }

    #[test]
    fn test_classify_with_parameters() {
        assert_eq!(
            classify_preview("text/plain; charset=utf-8"),
            PreviewKind::Text
        );
        assert_eq!(
            classify_preview("application/pdf; version=1.7"),
            PreviewKind::Pdf
        );
    }

    #[test]
    fn test_classify_unsupported() {
        assert_eq!(classify_preview("application/zip"), PreviewKind::Unsupported);
        assert_eq!(
            classify_preview("application/octet-stream"),
            PreviewKind::Unsupported
        );
        assert_eq!(classify_preview(""), PreviewKind::Unsupported);
    }
}

use mime::Mime;

/// 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const ACCEPTED_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejected {
    #[error("invalid content type '{0}'")]
    InvalidContentType(String),
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("file too large ({size} bytes, max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
    #[error("file is empty")]
    Empty,
}

/// Admission check applied to document metadata before extraction output is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Returns the normalised MIME type when the upload is admissible.
    pub fn validate(&self, content_type: &str, size_bytes: u64) -> Result<Mime, UploadRejected> {
        let mime = content_type
            .trim()
            .parse::<Mime>()
            .map_err(|_| UploadRejected::InvalidContentType(content_type.to_string()))?;
        let essence = mime.essence_str().to_ascii_lowercase();
        if !ACCEPTED_TYPES.contains(&essence.as_str()) {
            return Err(UploadRejected::UnsupportedType(essence));
        }
        if size_bytes == 0 {
            return Err(UploadRejected::Empty);
        }
        if size_bytes > self.max_bytes {
            return Err(UploadRejected::TooLarge {
                size: size_bytes,
                max: self.max_bytes,
            });
        }
        Ok(mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_documents_and_images() {
        let policy = UploadPolicy::default();
        for content_type in ["application/pdf", "image/png", "image/jpg", "IMAGE/WEBP"] {
            assert!(policy.validate(content_type, 1_024).is_ok(), "{content_type}");
        }
        assert!(policy.validate("application/pdf; name=w2.pdf", 1_024).is_ok());
    }

    #[test]
    fn rejects_other_types_and_oversized_files() {
        let policy = UploadPolicy::default();
        assert_eq!(
            policy.validate("text/csv", 10),
            Err(UploadRejected::UnsupportedType("text/csv".to_string()))
        );
        assert!(matches!(
            policy.validate("image/png", MAX_UPLOAD_BYTES + 1),
            Err(UploadRejected::TooLarge { .. })
        ));
        assert_eq!(policy.validate("image/png", 0), Err(UploadRejected::Empty));
        assert!(policy.validate("image/png", MAX_UPLOAD_BYTES).is_ok());
    }
}

//! Upload candidates and the client-side file policy.
//!
//! A candidate is gated here before any network activity takes place.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Reasons a selected file is refused before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a valid image file")]
    NotAnImage,

    #[error("File size must be less than 10MB")]
    TooLarge,
}

/// Check a file's declared MIME type and size against the upload policy.
///
/// # Errors
/// `NotAnImage` unless the MIME type starts with `image/`, `TooLarge` when the
/// size exceeds [`MAX_UPLOAD_BYTES`]. The type check runs first.
pub fn validate(mime_type: &str, size_bytes: u64) -> Result<(), ValidationError> {
    if !mime_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage);
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge);
    }
    Ok(())
}

/// A file the user selected for analysis.
#[derive(Debug, Clone, Serialize)]
pub struct UploadCandidate {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,

    /// Raw file content. Shared so a submission ticket can hold it cheaply.
    #[serde(skip)]
    pub content: Arc<[u8]>,
}

impl UploadCandidate {
    /// Build a candidate from in-memory bytes.
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        let size_bytes = content.len() as u64;
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
            content: content.into(),
        }
    }

    /// Load a candidate from disk.
    ///
    /// The MIME type is guessed from the extension and the policy is checked
    /// against file metadata, so oversized or non-image files are never read.
    ///
    /// # Errors
    /// Returns a validation error for refused files and an IO error when the
    /// file cannot be inspected or read.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(crate::MedlensError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        validate(&mime_type, metadata.len())?;

        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(file_name, mime_type, content))
    }

    /// Run the upload policy against this candidate.
    ///
    /// # Errors
    /// See [`validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.mime_type, self.size_bytes)
    }

    /// Size in megabytes with two decimals, e.g. `"4.77 MB"`.
    #[must_use]
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

/// Locally generated handle for the selected file's preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Opaque `preview://` reference, unique per selection.
    pub reference: String,
    pub file_name: String,
    pub size_label: String,
}

impl Preview {
    /// Create a fresh preview for a candidate.
    #[must_use]
    pub fn for_candidate(candidate: &UploadCandidate) -> Self {
        Self {
            reference: format!("preview://{}", uuid_v4()),
            file_name: candidate.file_name.clone(),
            size_label: candidate.size_label(),
        }
    }
}

/// Generate a random UUID v4 using a CSPRNG seeded from OS entropy.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_accepts_images_up_to_limit() {
        assert_eq!(validate("image/jpeg", 5 * 1024 * 1024), Ok(()));
        assert_eq!(validate("image/png", MAX_UPLOAD_BYTES), Ok(()));
        assert_eq!(validate("image/tiff", 0), Ok(()));
    }

    #[test]
    fn test_rejects_non_images() {
        for mime in ["application/pdf", "text/plain", "", "IMAGE/PNG", "application/dicom"] {
            assert_eq!(validate(mime, 10), Err(ValidationError::NotAnImage), "{mime}");
        }
    }

    #[test]
    fn test_rejects_oversized() {
        assert_eq!(
            validate("image/jpeg", MAX_UPLOAD_BYTES + 1),
            Err(ValidationError::TooLarge)
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        assert_eq!(
            validate("video/mp4", MAX_UPLOAD_BYTES * 4),
            Err(ValidationError::NotAnImage)
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::NotAnImage.to_string(),
            "Please select a valid image file"
        );
        assert_eq!(
            ValidationError::TooLarge.to_string(),
            "File size must be less than 10MB"
        );
    }

    #[test]
    fn test_size_label() {
        let candidate = UploadCandidate::new("scan.jpg", "image/jpeg", vec![0u8; 5 * 1024 * 1024]);
        assert_eq!(candidate.size_label(), "5.00 MB");
        assert_eq!(candidate.size_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_from_path_reads_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brain_mri.png");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(&[0x89, b'P', b'N', b'G']).expect("write");

        let candidate = UploadCandidate::from_path(&path).expect("should load");
        assert_eq!(candidate.file_name, "brain_mri.png");
        assert_eq!(candidate.mime_type, "image/png");
        assert_eq!(candidate.size_bytes, 4);
        assert_eq!(&candidate.content[..], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_from_path_refuses_non_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").expect("write");

        let err = UploadCandidate::from_path(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::MedlensError::Validation(ValidationError::NotAnImage)
        ));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = UploadCandidate::from_path(Path::new("/nonexistent/scan.jpg")).unwrap_err();
        assert!(matches!(err, crate::MedlensError::Io(_)));
    }

    #[test]
    fn test_preview_references_are_unique() {
        let candidate = UploadCandidate::new("ct.jpg", "image/jpeg", vec![1, 2, 3]);
        let a = Preview::for_candidate(&candidate);
        let b = Preview::for_candidate(&candidate);
        assert_ne!(a.reference, b.reference);
        assert!(a.reference.starts_with("preview://"));
        assert_eq!(a.reference.len(), "preview://".len() + 36);
        assert_eq!(a.file_name, "ct.jpg");
    }
}

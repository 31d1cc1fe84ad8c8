//! Uploaded file intake.
//!
//! Validates and persists raw uploads, handing back stable `/uploads/…`
//! references. Constraints are injected at construction; the directory
//! is created explicitly there, never as an import side effect. Callers
//! must await [`FileIntake::store`] before persisting any record that
//! points at the file.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use tokio::fs;
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};

const STORED_NAME_LENGTH: usize = 16;

/// Default per-file limit for portfolio uploads.
pub const PORTFOLIO_MAX_SIZE: usize = 10 * 1024 * 1024; // 10 MiB.
/// Default per-file limit for registration ID cards.
pub const ID_CARD_MAX_SIZE: usize = 5 * 1024 * 1024; // 5 MiB.

/// Accepted upload types: JPG, PNG or PDF only.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("pdf", "application/pdf"),
];

/// Limits enforced on every stored file.
#[derive(Clone, Copy, Debug)]
pub struct Constraints {
    pub max_count: usize,
    pub max_size: usize,
}

/// Validating store for one class of uploads.
#[derive(Clone, Debug)]
pub struct FileIntake {
    destination: PathBuf,
    public_prefix: String,
    constraints: Constraints,
}

impl FileIntake {
    /// Create a new [`FileIntake`] writing under `destination`.
    pub async fn new(
        destination: impl Into<PathBuf>,
        public_prefix: &str,
        constraints: Constraints,
    ) -> std::io::Result<Self> {
        let destination = destination.into();
        fs::create_dir_all(&destination).await?;

        Ok(Self {
            destination,
            public_prefix: public_prefix.trim_end_matches('/').to_owned(),
            constraints,
        })
    }

    pub fn max_count(&self) -> usize {
        self.constraints.max_count
    }

    /// Validate one upload without writing it.
    ///
    /// Returns the canonical extension the file will be stored with.
    pub fn check(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        size: usize,
    ) -> Result<&'static str> {
        let extension = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        let Some((extension, mime)) = extension.as_deref().and_then(|ext| {
            ALLOWED_TYPES.iter().copied().find(|(allowed, _)| *allowed == ext)
        }) else {
            return Err(field_error(
                "files",
                "File must be JPG, PNG or PDF.".into(),
            )
            .into());
        };

        if content_type.is_some_and(|ct| ct != mime) {
            return Err(field_error(
                "files",
                "File content type does not match its extension.".into(),
            )
            .into());
        }

        if size > self.constraints.max_size {
            return Err(field_error(
                "files",
                format!(
                    "File exceeds the {} byte limit.",
                    self.constraints.max_size
                )
                .into(),
            )
            .into());
        }

        Ok(extension)
    }

    /// Validate and persist one upload, returning its public reference.
    pub async fn store(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String> {
        let extension = self.check(filename, content_type, bytes.len())?;

        let name = format!(
            "{}.{extension}",
            Alphanumeric
                .sample_string(&mut OsRng, STORED_NAME_LENGTH)
                .to_lowercase()
        );
        fs::write(self.destination.join(&name), bytes)
            .await
            .map_err(|err| ServerError::internal("cannot write upload", err))?;

        Ok(format!("{}/{name}", self.public_prefix))
    }
}

fn field_error(field: &'static str, message: Cow<'static, str>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(field).with_message(message));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn intake(max_size: usize) -> FileIntake {
        FileIntake::new(
            std::env::temp_dir().join("studentport-intake-tests"),
            "/uploads",
            Constraints {
                max_count: 10,
                max_size,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_check_accepts_known_types() {
        let intake = intake(1024).await;
        assert_eq!(
            intake
                .check(Some("scan.PDF"), Some("application/pdf"), 10)
                .unwrap(),
            "pdf"
        );
        assert_eq!(intake.check(Some("photo.jpeg"), None, 10).unwrap(), "jpeg");
    }

    #[tokio::test]
    async fn test_check_refuses_unknown_extension() {
        let intake = intake(1024).await;
        assert!(intake.check(Some("run.exe"), None, 10).is_err());
        assert!(intake.check(Some("noextension"), None, 10).is_err());
        assert!(intake.check(None, None, 10).is_err());
    }

    #[tokio::test]
    async fn test_check_refuses_mismatched_content_type() {
        let intake = intake(1024).await;
        assert!(
            intake
                .check(Some("image.png"), Some("application/pdf"), 10)
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_check_refuses_oversized_file() {
        let intake = intake(16).await;
        assert!(intake.check(Some("a.png"), Some("image/png"), 17).is_err());
        assert!(intake.check(Some("a.png"), Some("image/png"), 16).is_ok());
    }

    #[tokio::test]
    async fn test_store_writes_and_returns_reference() {
        let intake = intake(1024).await;
        let reference = intake
            .store(Some("cover.png"), Some("image/png"), b"not-a-real-png")
            .await
            .unwrap();

        assert!(reference.starts_with("/uploads/"));
        assert!(reference.ends_with(".png"));
    }
}

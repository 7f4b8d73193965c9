//! Content signature verification for depot.
//!
//! Uploads may claim any allowed extension; the inspector checks the
//! object's leading bytes against that claim. The capability is modeled
//! as a trait with a no-op default so the pipeline always makes the call
//! and never branches on whether verification is enabled.

use crate::{DepotError, Result};

/// Capability interface for verifying file content against the claimed
/// extension.
pub trait ContentInspector: Send + Sync {
    /// Verify the leading bytes of an object against `claimed_ext`.
    ///
    /// Implementations should fail open for extensions they cannot judge.
    fn verify(&self, head: &[u8], claimed_ext: &str) -> Result<()>;
}

/// No-op inspector used when signature verification is disabled.
///
/// Fail-open: every object passes. This is a documented product risk,
/// not a defect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInspector;

impl ContentInspector for NoopInspector {
    fn verify(&self, _head: &[u8], _claimed_ext: &str) -> Result<()> {
        Ok(())
    }
}

/// Extensions with a reliable magic-byte signature, mapped to the MIME
/// types accepted for them. Extensions absent from this table (plain
/// text formats mostly) are not judged.
const STRICT_MIME: &[(&str, &[&str])] = &[
    ("pdf", &["application/pdf"]),
    ("jpg", &["image/jpeg"]),
    ("jpeg", &["image/jpeg"]),
    ("png", &["image/png"]),
    ("gif", &["image/gif"]),
    ("bmp", &["image/bmp"]),
    ("webp", &["image/webp"]),
    ("mp4", &["video/mp4"]),
    ("avi", &["video/x-msvideo"]),
    ("mov", &["video/quicktime"]),
    ("mp3", &["audio/mpeg"]),
    ("wav", &["audio/x-wav", "audio/wav"]),
    ("ogg", &["audio/ogg", "video/ogg"]),
    ("zip", &["application/zip"]),
    ("rar", &["application/vnd.rar", "application/x-rar-compressed"]),
    ("7z", &["application/x-7z-compressed"]),
    ("gz", &["application/gzip"]),
    ("tar", &["application/x-tar"]),
    // OOXML containers are zip archives; detection may name either
    (
        "docx",
        &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/zip",
        ],
    ),
    (
        "xlsx",
        &[
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/zip",
        ],
    ),
    (
        "pptx",
        &[
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/zip",
        ],
    ),
];

/// Magic-byte inspector.
///
/// Detects the true media type from the object's first bytes and rejects
/// uploads whose content contradicts a strictly-mapped extension, e.g. an
/// executable renamed to `photo.jpg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicInspector;

impl MagicInspector {
    fn accepted_mimes(claimed_ext: &str) -> Option<&'static [&'static str]> {
        let ext = claimed_ext.to_lowercase();
        STRICT_MIME
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, mimes)| *mimes)
    }
}

impl ContentInspector for MagicInspector {
    fn verify(&self, head: &[u8], claimed_ext: &str) -> Result<()> {
        let accepted = match Self::accepted_mimes(claimed_ext) {
            Some(mimes) => mimes,
            // No reliable signature for this extension; let it through.
            None => return Ok(()),
        };

        let detected = match infer::get(head) {
            Some(kind) => kind.mime_type(),
            None => {
                // A strictly-mapped extension whose content matches no
                // known signature cannot be what it claims.
                return Err(DepotError::ContentMismatch {
                    detected: "unrecognized content".to_string(),
                    expected: claimed_ext.to_lowercase(),
                });
            }
        };

        if accepted.contains(&detected) {
            return Ok(());
        }

        Err(DepotError::ContentMismatch {
            detected: detected.to_string(),
            expected: claimed_ext.to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid PNG header (magic + IHDR start).
    const PNG_HEAD: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    /// PDF magic.
    const PDF_HEAD: &[u8] = b"%PDF-1.7\n%binary";

    /// Windows executable magic (MZ).
    const EXE_HEAD: &[u8] = &[
        0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00,
        0x00,
    ];

    #[test]
    fn test_noop_accepts_anything() {
        let inspector = NoopInspector;
        assert!(inspector.verify(EXE_HEAD, "jpg").is_ok());
        assert!(inspector.verify(b"", "pdf").is_ok());
    }

    #[test]
    fn test_magic_accepts_matching_content() {
        let inspector = MagicInspector;
        assert!(inspector.verify(PNG_HEAD, "png").is_ok());
        assert!(inspector.verify(PDF_HEAD, "pdf").is_ok());
    }

    #[test]
    fn test_magic_rejects_mismatched_content() {
        let inspector = MagicInspector;
        let result = inspector.verify(EXE_HEAD, "jpg");
        assert!(matches!(result, Err(DepotError::ContentMismatch { .. })));

        let result = inspector.verify(PNG_HEAD, "pdf");
        assert!(matches!(result, Err(DepotError::ContentMismatch { .. })));
    }

    #[test]
    fn test_magic_rejects_unrecognizable_content_for_strict_ext() {
        let inspector = MagicInspector;
        let result = inspector.verify(b"just some text", "pdf");
        assert!(matches!(result, Err(DepotError::ContentMismatch { .. })));
    }

    #[test]
    fn test_magic_skips_unmapped_extensions() {
        // txt/csv have no magic signature; the check does not judge them.
        let inspector = MagicInspector;
        assert!(inspector.verify(b"plain text content", "txt").is_ok());
        assert!(inspector.verify(b"a,b,c", "csv").is_ok());
    }

    #[test]
    fn test_magic_extension_case_insensitive() {
        let inspector = MagicInspector;
        assert!(inspector.verify(PNG_HEAD, "PNG").is_ok());
        assert!(inspector.verify(EXE_HEAD, "JPG").is_err());
    }
}

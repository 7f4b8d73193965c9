//! Upload validation for depot.
//!
//! Filename sanitization and the extension/size gates applied before any
//! byte reaches storage. The policy is an immutable value built once at
//! startup and injected where needed; tests construct their own.

use std::collections::HashSet;

use crate::config::StorageConfig;
use crate::file::MAX_FILENAME_BYTES;
use crate::{DepotError, Result};

/// Immutable upload validation policy.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_size: u64,
    allowed: HashSet<String>,
    blocked: HashSet<String>,
}

impl UploadPolicy {
    /// Create a policy from explicit values. Extension sets are
    /// lower-cased on entry.
    pub fn new(
        max_file_size: u64,
        allowed: impl IntoIterator<Item = String>,
        blocked: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed: allowed.into_iter().map(|e| e.to_lowercase()).collect(),
            blocked: blocked.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Build the policy from the storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed: config.allowed_set(),
            blocked: config.blocked_set(),
        }
    }

    /// The configured size ceiling in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Extract and validate the extension of a sanitized filename.
    ///
    /// The extension is the substring after the final dot, lower-cased.
    /// A name without one is rejected. The block list is checked before
    /// the allow list, so a dangerous extension stays rejected even if it
    /// was misconfigured into the allow set.
    pub fn validate_extension(&self, safe_name: &str) -> Result<String> {
        let ext = match safe_name.rsplit_once('.') {
            Some((_, e)) if !e.is_empty() => e.to_lowercase(),
            _ => {
                return Err(DepotError::InvalidExtension(
                    "file must have an extension".to_string(),
                ))
            }
        };

        if self.blocked.contains(&ext) {
            return Err(DepotError::InvalidExtension(format!(
                ".{ext} is blocked for security reasons"
            )));
        }

        if !self.allowed.contains(&ext) {
            return Err(DepotError::InvalidExtension(format!(".{ext}")));
        }

        Ok(ext)
    }

    /// Validate a measured payload size against the ceiling.
    pub fn validate_size(&self, size: u64) -> Result<u64> {
        if size > self.max_file_size {
            return Err(DepotError::PayloadTooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(size)
    }
}

/// Sanitize a user-supplied filename.
///
/// - strips any path component (keeps the basename only)
/// - replaces every character outside `[A-Za-z0-9_.\- ]` with `_`
/// - collapses all but the last `.` into `_` (defeats double-extension
///   tricks such as `malware.exe.jpg`)
/// - truncates to 255 bytes, preserving the final extension
///
/// Deterministic, no I/O, always returns a string; sanitizing twice
/// yields the same result as sanitizing once.
pub fn sanitize_filename(raw: &str) -> String {
    // Keep only the basename; both separators count so a Windows-style
    // path cannot smuggle components through.
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Keep only the last extension; earlier dots become underscores.
    let collapsed = match cleaned.rsplit_once('.') {
        Some((name, ext)) => format!("{}.{}", name.replace('.', "_"), ext),
        None => cleaned,
    };

    // Everything left is ASCII, so byte slicing cannot split a char.
    if collapsed.len() <= MAX_FILENAME_BYTES {
        return collapsed;
    }

    match collapsed.rsplit_once('.') {
        Some((name, ext)) => {
            let keep = MAX_FILENAME_BYTES.saturating_sub(ext.len() + 1);
            format!("{}.{}", &name[..keep.min(name.len())], ext)
        }
        None => collapsed[..MAX_FILENAME_BYTES].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_policy() -> UploadPolicy {
        UploadPolicy::from_config(&StorageConfig::default())
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("/etc/shadow"), "shadow");
        assert_eq!(sanitize_filename("C:\\Users\\evil.exe"), "evil.exe");
        assert_eq!(sanitize_filename("dir/sub/report.pdf"), "report.pdf");
    }

    #[test]
    fn test_sanitize_result_has_no_separators() {
        for input in ["../../a.txt", "..\\..\\b.txt", "/abs/path/c.txt"] {
            let safe = sanitize_filename(input);
            assert!(!safe.contains('/'), "{safe}");
            assert!(!safe.contains('\\'), "{safe}");
        }
    }

    #[test]
    fn test_sanitize_replaces_special_characters() {
        assert_eq!(sanitize_filename("re:port*?.pdf"), "re_port__.pdf");
        assert_eq!(sanitize_filename("läche<ln>.png"), "l_che_ln_.png");
        assert_eq!(sanitize_filename("a b-c_d.txt"), "a b-c_d.txt");
    }

    #[test]
    fn test_sanitize_collapses_double_extensions() {
        assert_eq!(sanitize_filename("malware.exe.jpg"), "malware_exe.jpg");
        assert_eq!(sanitize_filename("a.b.c.txt"), "a_b_c.txt");
    }

    #[test]
    fn test_sanitize_truncates_preserving_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let safe = sanitize_filename(&long);
        assert_eq!(safe.len(), 255);
        assert!(safe.ends_with(".pdf"));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "../../etc/passwd",
            "malware.exe.jpg",
            "普通のファイル.txt",
            "re:port*?.pdf",
            &format!("{}.pdf", "x".repeat(300)),
            "no_extension",
            "",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_validate_extension_allowed() {
        let policy = test_policy();
        assert_eq!(policy.validate_extension("report.pdf").unwrap(), "pdf");
        assert_eq!(policy.validate_extension("PHOTO.JPG").unwrap(), "jpg");
    }

    #[test]
    fn test_validate_extension_missing() {
        let policy = test_policy();
        assert!(matches!(
            policy.validate_extension("README"),
            Err(DepotError::InvalidExtension(_))
        ));
        assert!(matches!(
            policy.validate_extension("trailing."),
            Err(DepotError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_validate_extension_blocked() {
        let policy = test_policy();
        assert!(matches!(
            policy.validate_extension("virus.exe"),
            Err(DepotError::InvalidExtension(_))
        ));
        assert!(matches!(
            policy.validate_extension("script.js"),
            Err(DepotError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_blocklist_wins_over_allowlist() {
        // exe deliberately present in both sets
        let policy = UploadPolicy::new(
            1024,
            vec!["exe".to_string(), "txt".to_string()],
            vec!["exe".to_string()],
        );
        assert!(policy.validate_extension("tool.exe").is_err());
        assert!(policy.validate_extension("notes.txt").is_ok());
    }

    #[test]
    fn test_validate_extension_unrecognized() {
        let policy = test_policy();
        assert!(matches!(
            policy.validate_extension("data.xyz"),
            Err(DepotError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_extension_gate_is_total() {
        // Every input is classified exactly one of: no-extension,
        // blocked, unrecognized, or allowed. Nothing reaches storage
        // without landing in the allowed bucket.
        let policy = test_policy();
        for name in ["a.pdf", "a.exe", "a.xyz", "a", "a."] {
            match policy.validate_extension(name) {
                Ok(ext) => assert_eq!(ext, "pdf"),
                Err(DepotError::InvalidExtension(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_validate_size_boundary() {
        let policy = UploadPolicy::new(1024, vec!["txt".to_string()], vec![]);
        // Exactly at the ceiling succeeds
        assert_eq!(policy.validate_size(1024).unwrap(), 1024);
        // One byte over fails
        assert!(matches!(
            policy.validate_size(1025),
            Err(DepotError::PayloadTooLarge { size: 1025, limit: 1024 })
        ));
    }

    #[test]
    fn test_policy_lowercases_configured_extensions() {
        let policy = UploadPolicy::new(1024, vec!["PDF".to_string()], vec!["EXE".to_string()]);
        assert!(policy.validate_extension("doc.pdf").is_ok());
        assert!(policy.validate_extension("doc.EXE").is_err());
    }
}

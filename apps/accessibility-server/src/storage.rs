//! On-disk layout for uploads and generated reports
//!
//! Uploads land in `upload_dir` under a sanitised name. For an upload
//! `name.pdf` the reports are `name_report.txt` and `name_contrast.html`
//! in `report_dir`.
//!
//! Writing a report and splicing contrast into it is a read-modify-write on
//! disk. Callers hold [`ReportStore::with_report_lock`] for the whole
//! sequence so uploads sharing a name cannot interleave.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::ServerError;

pub const REPORT_SUFFIX: &str = "_report.txt";
pub const CONTRAST_SUFFIX: &str = "_contrast.html";

#[derive(Debug, Clone)]
pub struct ReportStore {
    upload_dir: PathBuf,
    report_dir: PathBuf,
    /// One lock per report base name
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ReportStore {
    /// Create the store, making both directories if needed
    pub fn open(upload_dir: impl Into<PathBuf>, report_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let store = Self {
            upload_dir: upload_dir.into(),
            report_dir: report_dir.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        };
        fs::create_dir_all(&store.upload_dir)?;
        fs::create_dir_all(&store.report_dir)?;
        Ok(store)
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Run `job` while holding the lock for `upload_name`'s reports
    pub fn with_report_lock<T>(&self, upload_name: &str, job: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(base_name(upload_name).to_string())
                .or_default()
                .clone()
        };
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        job()
    }

    /// Save an uploaded PDF, returning its sanitised file name
    pub fn save_upload(&self, filename: &str, bytes: &[u8]) -> Result<String, ServerError> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| ServerError::InvalidRequest(format!("Invalid file name: {}", filename)))?;
        let path = self.upload_dir.join(&name);
        fs::write(&path, bytes)?;
        debug!("Saved upload to {}", path.display());
        Ok(name)
    }

    pub fn write_report(&self, upload_name: &str, text: &str) -> Result<String, ServerError> {
        self.write(upload_name, REPORT_SUFFIX, text)
    }

    pub fn write_contrast_html(&self, upload_name: &str, html: &str) -> Result<String, ServerError> {
        self.write(upload_name, CONTRAST_SUFFIX, html)
    }

    /// Read a stored report, rewrite it with `update`, and write it back
    pub fn update_report<F>(&self, report_name: &str, update: F) -> Result<(), ServerError>
    where
        F: FnOnce(&str) -> String,
    {
        let path = self.report_dir.join(report_name);
        let current = fs::read_to_string(&path)?;
        let updated = update(&current);
        if updated != current {
            fs::write(&path, updated)?;
        }
        Ok(())
    }

    /// Path of a stored report. Names containing path separators or `..`
    /// are rejected as not found.
    pub fn report_path(&self, filename: &str) -> Result<PathBuf, ServerError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ServerError::NotFound(filename.to_string()));
        }
        let path = self.report_dir.join(filename);
        if !path.is_file() {
            return Err(ServerError::NotFound(filename.to_string()));
        }
        Ok(path)
    }

    fn write(&self, upload_name: &str, suffix: &str, content: &str) -> Result<String, ServerError> {
        let name = format!("{}{}", base_name(upload_name), suffix);
        fs::write(self.report_dir.join(&name), content)?;
        Ok(name)
    }
}

/// Final path component with anything outside `[A-Za-z0-9._-]` replaced by
/// `_`. `None` when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let last = filename.rsplit(&['/', '\\'][..]).next().unwrap_or(filename);
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(cleaned)
    }
}

/// File name without a trailing `.pdf` (any case)
pub fn base_name(filename: &str) -> &str {
    let len = filename.len();
    if len > 4 && filename.is_char_boundary(len - 4) && filename[len - 4..].eq_ignore_ascii_case(".pdf") {
        &filename[..len - 4]
    } else {
        filename
    }
}

pub fn is_pdf_name(filename: &str) -> bool {
    base_name(filename).len() < filename.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn temp_store(tag: &str) -> ReportStore {
        let root = std::env::temp_dir().join(format!(
            "accessibility-store-{}-{}",
            tag,
            std::process::id()
        ));
        ReportStore::open(root.join("uploads"), root.join("reports")).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\docs\\my file.pdf").as_deref(),
            Some("my_file.pdf")
        );
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("annual.pdf"), "annual");
        assert_eq!(base_name("ANNUAL.PDF"), "ANNUAL");
        assert_eq!(base_name("notes.txt"), "notes.txt");
        assert_eq!(base_name(".pdf"), ".pdf");
        assert!(is_pdf_name("a.pdf"));
        assert!(!is_pdf_name("a.docx"));
    }

    #[test]
    fn test_report_round_trip_and_update() {
        let store = temp_store("roundtrip");
        let name = store.write_report("annual.pdf", "original").unwrap();
        assert_eq!(name, "annual_report.txt");

        store
            .update_report(&name, |text| format!("{} + merged", text))
            .unwrap();
        let path = store.report_path(&name).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "original + merged");
    }

    #[test]
    fn test_report_path_rejects_traversal() {
        let store = temp_store("traversal");
        for name in ["../secret", "a/b.txt", "..", "x\\y", "missing.txt"] {
            assert!(matches!(
                store.report_path(name),
                Err(ServerError::NotFound(_))
            ));
        }
    }

    #[test]
    fn test_report_lock_serializes_write_and_merge() {
        let store = temp_store("locking");
        for _ in 0..4 {
            let handles: Vec<_> = ["alpha", "bravo"]
                .into_iter()
                .map(|tag| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        store.with_report_lock("shared.pdf", || {
                            let name = store.write_report("shared.pdf", tag).unwrap();
                            std::thread::sleep(std::time::Duration::from_millis(5));
                            store
                                .update_report(&name, |text| format!("{}+{}", text, tag))
                                .unwrap();
                        })
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let path = store.report_path("shared_report.txt").unwrap();
            let text = fs::read_to_string(path).unwrap();
            assert!(text == "alpha+alpha" || text == "bravo+bravo", "interleaved: {}", text);
        }
    }

    proptest! {
        #[test]
        fn sanitized_names_stay_in_directory(name in ".{0,40}") {
            if let Some(clean) = sanitize_filename(&name) {
                prop_assert!(!clean.contains('/'));
                prop_assert!(!clean.contains('\\'));
                prop_assert!(!clean.starts_with('.'));
                prop_assert!(!clean.is_empty());
            }
        }
    }
}

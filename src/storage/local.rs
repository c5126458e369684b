//! Directory-tree audio store.
//!
//! Layout: `<base>/<doc_type>/<YYYY>/<MM>/<file>.mp3` plus
//! `<file>.mp3.meta`.  Dates use the local clock.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use walkdir::WalkDir;

use crate::config::{AppConfig, AppPaths};
use crate::document::DocumentType;
use crate::storage::metadata::{sidecar_path, FileInfo};
use crate::storage::StoreError;

/// Extension of files reported by [`LocalStore::list_files`].
pub const AUDIO_EXTENSION: &str = ".mp3";

#[derive(Debug, Clone)]
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) a store rooted at `base_dir`, including
    /// one directory per [`DocumentType`].
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        for doc_type in DocumentType::ALL {
            let dir = base_dir.join(doc_type.as_str());
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(Self { base_dir })
    }

    /// The store configured in `config`, or the default under the user's
    /// documents directory.
    pub fn open_default(config: &AppConfig, paths: &AppPaths) -> Result<Self, StoreError> {
        Self::new(config.storage.resolve_base_dir(paths))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Copy `temp_audio` into the store and write its sidecar.
    ///
    /// `doc_type` defaults to the category inferred from
    /// `original_reference`'s extension, or `other` without a reference.
    pub fn save(
        &self,
        temp_audio: &Path,
        original_reference: Option<&str>,
        doc_type: Option<DocumentType>,
    ) -> Result<PathBuf, StoreError> {
        self.save_at(temp_audio, original_reference, doc_type, Local::now().naive_local())
    }

    /// [`save`](Self::save) with an explicit clock.
    pub fn save_at(
        &self,
        temp_audio: &Path,
        original_reference: Option<&str>,
        doc_type: Option<DocumentType>,
        now: NaiveDateTime,
    ) -> Result<PathBuf, StoreError> {
        let doc_type = doc_type.unwrap_or_else(|| {
            original_reference
                .map(DocumentType::from_reference)
                .unwrap_or(DocumentType::Other)
        });

        let file_name = temp_audio
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| format!("audio_{}.mp3", now.format("%Y%m%d_%H%M%S")).into());

        let dir = self.month_dir(doc_type, now);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let canonical = dir.join(file_name);

        if same_file(temp_audio, &canonical) {
            log::debug!("store: {} is already in place", canonical.display());
        } else {
            copy_preserving_mtime(temp_audio, &canonical)?;
        }

        // Not atomic with the copy above; get_file_info tolerates a missing sidecar.
        let sidecar = sidecar_path(&canonical);
        let info = FileInfo::new(original_reference, now, doc_type);
        fs::write(&sidecar, info.to_sidecar_string()).map_err(|e| StoreError::io(&sidecar, e))?;

        log::info!("store: saved {} ({doc_type})", canonical.display());
        Ok(canonical)
    }

    /// Sidecar of a stored file; `Ok(None)` when there is none.
    pub fn get_file_info(&self, audio: &Path) -> Result<Option<FileInfo>, StoreError> {
        let sidecar = sidecar_path(audio);
        match fs::read_to_string(&sidecar) {
            Ok(text) => Ok(Some(FileInfo::parse(&text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&sidecar, e)),
        }
    }

    /// Every `.mp3` under the store, or under one category.  Order follows
    /// the filesystem walk.
    pub fn list_files(&self, doc_type: Option<DocumentType>) -> Vec<PathBuf> {
        let root = match doc_type {
            Some(t) => self.base_dir.join(t.as_str()),
            None => self.base_dir.clone(),
        };
        if !root.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(AUDIO_EXTENSION))
            .map(|entry| entry.into_path())
            .collect()
    }

    fn month_dir(&self, doc_type: DocumentType, now: NaiveDateTime) -> PathBuf {
        self.base_dir
            .join(doc_type.as_str())
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
    }
}

/// Whether both paths name the same existing file.
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_preserving_mtime(from: &Path, to: &Path) -> Result<(), StoreError> {
    fs::copy(from, to).map_err(|e| StoreError::io(from, e))?;

    let modified = fs::metadata(from).and_then(|m| m.modified());
    let restored = modified.and_then(|mtime| {
        fs::File::options()
            .write(true)
            .open(to)
            .and_then(|f| f.set_modified(mtime))
    });
    if let Err(e) = restored {
        log::warn!("store: could not preserve mtime on {} ({e})", to.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::metadata::KEY_DOCUMENT_TYPE;
    use chrono::NaiveDate;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn may_2024() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
    }

    fn temp_audio(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"ID3 fake mp3").unwrap();
        path
    }

    #[test]
    fn new_creates_category_dirs_idempotently() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("store");
        LocalStore::new(&base).unwrap();
        LocalStore::new(&base).unwrap();

        for t in DocumentType::ALL {
            assert!(base.join(t.as_str()).is_dir());
        }
    }

    #[test]
    fn save_writes_canonical_file_and_sidecar() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        let temp = temp_audio(dir.path(), "report.mp3");

        let stored = store
            .save_at(&temp, Some("report.pdf"), Some(DocumentType::Pdf), may_2024())
            .unwrap();

        assert_eq!(stored, store.base_dir().join("pdf/2024/05/report.mp3"));
        assert_eq!(fs::read(&stored).unwrap(), b"ID3 fake mp3");
        assert!(sidecar_path(&stored).exists());
        assert!(temp.exists(), "save copies, it does not move");

        let info = store.get_file_info(&stored).unwrap().expect("sidecar");
        assert_eq!(info.get(KEY_DOCUMENT_TYPE), Some("pdf"));
        assert_eq!(info.original_document(), Some("report.pdf"));
        assert_eq!(info.creation_date(), Some(may_2024()));
    }

    #[test]
    fn type_is_inferred_from_reference() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        let temp = temp_audio(dir.path(), "a.mp3");

        let docx = store.save_at(&temp, Some("Notes.DOCX"), None, may_2024()).unwrap();
        assert!(docx.starts_with(store.base_dir().join("docx")));

        let other = store.save_at(&temp, Some("notes.odt"), None, may_2024()).unwrap();
        assert!(other.starts_with(store.base_dir().join("other")));

        let none = store.save_at(&temp, None, None, may_2024()).unwrap();
        let info = store.get_file_info(&none).unwrap().unwrap();
        assert_eq!(info.document_type(), Some(DocumentType::Other));
        assert_eq!(info.original_document(), None);
    }

    #[test]
    fn modification_time_is_preserved() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        let temp = temp_audio(dir.path(), "old.mp3");
        let past = SystemTime::now() - Duration::from_secs(86_400 * 30);
        fs::File::options()
            .write(true)
            .open(&temp)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let stored = store.save(&temp, Some("old.pdf"), None).unwrap();
        let got = fs::metadata(&stored).unwrap().modified().unwrap();
        let delta = got
            .duration_since(past)
            .unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(2));
    }

    #[test]
    fn missing_sidecar_is_none_not_error() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        let orphan = temp_audio(dir.path(), "orphan.mp3");

        assert!(store.get_file_info(&orphan).unwrap().is_none());
        assert!(store
            .get_file_info(&dir.path().join("never-existed.mp3"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn list_files_filters_by_type_and_extension() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        let a = temp_audio(dir.path(), "a.mp3");
        let b = temp_audio(dir.path(), "b.mp3");

        let pdf = store.save_at(&a, Some("a.pdf"), None, may_2024()).unwrap();
        let docx = store.save_at(&b, Some("b.docx"), None, may_2024()).unwrap();

        let mut all = store.list_files(None);
        all.sort();
        let mut expected = vec![pdf.clone(), docx];
        expected.sort();
        assert_eq!(all, expected, "sidecars are not listed");

        assert_eq!(store.list_files(Some(DocumentType::Pdf)), vec![pdf]);
        assert!(store.list_files(Some(DocumentType::GoogleDocs)).is_empty());
    }

    #[test]
    fn list_files_on_missing_subtree_is_empty() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        fs::remove_dir_all(store.base_dir().join("other")).unwrap();

        assert!(store.list_files(Some(DocumentType::Other)).is_empty());
    }

    #[test]
    fn saving_a_file_already_in_place_keeps_its_content() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        let month = store.base_dir().join("pdf/2024/05");
        fs::create_dir_all(&month).unwrap();
        let in_place = temp_audio(&month, "mine.mp3");

        let stored = store
            .save_at(&in_place, Some("mine.pdf"), Some(DocumentType::Pdf), may_2024())
            .unwrap();

        assert_eq!(stored, in_place);
        assert_eq!(fs::read(&stored).unwrap(), b"ID3 fake mp3");
        let info = store.get_file_info(&stored).unwrap().expect("sidecar");
        assert_eq!(info.original_document(), Some("mine.pdf"));
    }

    #[test]
    fn same_file_compares_resolved_paths() {
        let dir = tempdir().expect("temp dir");
        let a = temp_audio(dir.path(), "a.mp3");
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(same_file(&a, &dir.path().join("sub/../a.mp3")));
        assert!(!same_file(&a, &temp_audio(dir.path(), "b.mp3")));
        assert!(!same_file(&a, &dir.path().join("missing.mp3")));
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let store = LocalStore::new(dir.path().join("store")).unwrap();

        let err = store
            .save(&dir.path().join("missing.mp3"), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("missing.mp3"));
    }
}

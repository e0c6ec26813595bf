//! Document object store: CVs and assessments attached to candidates.
//!
//! Files are copied under `documents/<candidate-id>/` and named by kind and
//! content hash, so re-uploading the same file is a no-op on disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::model::{Candidate, DocumentKind, DocumentRef};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Copies a local file into the object store.
    ///
    /// Does not touch the candidate row; the caller attaches the returned
    /// reference and writes the candidate.
    pub fn upload_document(
        &self,
        candidate_id: Uuid,
        kind: DocumentKind,
        source: &Path,
    ) -> Result<DocumentRef> {
        let bytes = fs::read(source)?;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::Corrupt(format!("not a file: {}", source.display())))?;
        let extension = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let relative = format!("{candidate_id}/{}-{}{extension}", kind.as_str(), &sha256[..16]);
        let target = self.documents_dir().join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &bytes)?;

        tracing::info!(candidate = %candidate_id, kind = kind.as_str(), path = %relative, "stored document");
        Ok(DocumentRef {
            path: relative,
            file_name,
            sha256,
        })
    }

    /// Uploads `source`, attaches it to `candidate` and writes the candidate.
    ///
    /// If the write fails the new file is removed again, unless it is the
    /// file the candidate already pointed at. On success the document it
    /// replaced is removed.
    pub fn attach_document(
        &self,
        candidate: &mut Candidate,
        kind: DocumentKind,
        source: &Path,
    ) -> Result<DocumentRef> {
        let document = self.upload_document(candidate.id, kind, source)?;
        let replaced = candidate.attach(kind, document.clone());
        let unchanged = replaced.as_ref().is_some_and(|old| old.path == document.path);

        if let Err(e) = self.update_candidate(candidate) {
            if !unchanged && let Err(cleanup) = self.remove_document(&document) {
                tracing::warn!(path = %document.path, error = %cleanup, "failed to remove unattached document");
            }
            return Err(e);
        }

        if let Some(old) = replaced.filter(|_| !unchanged)
            && let Err(e) = self.remove_document(&old)
        {
            tracing::warn!(path = %old.path, error = %e, "failed to remove replaced document");
        }
        Ok(document)
    }

    /// Reads a stored document back.
    pub fn download_document(&self, document: &DocumentRef) -> Result<Vec<u8>> {
        let path = self.document_path(document)?;
        Ok(fs::read(path)?)
    }

    /// Removes a single stored document. Missing files are ignored.
    pub fn remove_document(&self, document: &DocumentRef) -> Result<()> {
        let path = self.document_path(document)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every document stored for a candidate.
    pub(super) fn remove_candidate_documents(&self, candidate_id: Uuid) -> Result<()> {
        let dir = self.documents_dir().join(candidate_id.to_string());
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Resolves a stored reference, refusing paths that escape the document root.
    fn document_path(&self, document: &DocumentRef) -> Result<PathBuf> {
        let relative = Path::new(&document.path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::Corrupt(format!(
                "invalid document path: {}",
                document.path
            )));
        }
        Ok(self.documents_dir().join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::candidate::tests::sample_candidate;
    use crate::storage::test_support::test_storage;

    fn stored_files(storage: &Storage, candidate: Uuid) -> usize {
        fs::read_dir(storage.documents_dir().join(candidate.to_string()))
            .map(Iterator::count)
            .unwrap_or(0)
    }

    #[test]
    fn upload_then_download_returns_same_bytes() {
        let (dir, storage) = test_storage();
        let source = dir.path().join("ada-cv.pdf");
        fs::write(&source, b"%PDF-1.7 fake").unwrap();
        let candidate = Uuid::new_v4();

        let document = storage
            .upload_document(candidate, DocumentKind::Cv, &source)
            .unwrap();

        assert_eq!(document.file_name, "ada-cv.pdf");
        assert!(document.path.starts_with(&candidate.to_string()));
        assert!(document.path.ends_with(".pdf"));
        assert_eq!(document.sha256.len(), 64);
        assert_eq!(
            storage.download_document(&document).unwrap(),
            b"%PDF-1.7 fake"
        );
    }

    #[test]
    fn candidate_documents_are_removed_together() {
        let (dir, storage) = test_storage();
        let source = dir.path().join("report.txt");
        fs::write(&source, "scores").unwrap();
        let candidate = Uuid::new_v4();
        let document = storage
            .upload_document(candidate, DocumentKind::Assessment, &source)
            .unwrap();

        storage.remove_candidate_documents(candidate).unwrap();

        assert!(storage.download_document(&document).is_err());
        // Nothing left to remove is fine.
        storage.remove_candidate_documents(candidate).unwrap();
    }

    #[test]
    fn escaping_paths_are_refused() {
        let (_dir, storage) = test_storage();
        let document = DocumentRef {
            path: "../staffbook.sqlite".into(),
            file_name: "x".into(),
            sha256: String::new(),
        };

        assert!(matches!(
            storage.download_document(&document).unwrap_err(),
            StorageError::Corrupt(_)
        ));
    }

    #[test]
    fn attaching_replaces_the_previous_file() {
        let (dir, storage) = test_storage();
        let mut candidate = sample_candidate("Ada", "Engineering", "QA Engineer");
        storage.create_candidate(&candidate).unwrap();
        let first = dir.path().join("cv-v1.pdf");
        let second = dir.path().join("cv-v2.pdf");
        fs::write(&first, "v1").unwrap();
        fs::write(&second, "v2").unwrap();

        let old = storage
            .attach_document(&mut candidate, DocumentKind::Cv, &first)
            .unwrap();
        let new = storage
            .attach_document(&mut candidate, DocumentKind::Cv, &second)
            .unwrap();

        assert!(storage.download_document(&old).is_err());
        assert_eq!(storage.download_document(&new).unwrap(), b"v2");
        assert_eq!(stored_files(&storage, candidate.id), 1);
        let loaded = storage.load_candidate(candidate.id).unwrap();
        assert_eq!(loaded.document(DocumentKind::Cv), Some(&new));
    }

    #[test]
    fn failed_write_leaves_no_orphaned_file() {
        let (dir, storage) = test_storage();
        let candidate = sample_candidate("Ada", "Engineering", "QA Engineer");
        storage.create_candidate(&candidate).unwrap();
        let mut first = storage.load_candidate(candidate.id).unwrap();
        let mut stale = storage.load_candidate(candidate.id).unwrap();
        let cv = dir.path().join("cv.pdf");
        let other = dir.path().join("other.pdf");
        fs::write(&cv, "cv").unwrap();
        fs::write(&other, "other").unwrap();

        let kept = storage
            .attach_document(&mut first, DocumentKind::Cv, &cv)
            .unwrap();
        let err = storage
            .attach_document(&mut stale, DocumentKind::Cv, &other)
            .unwrap_err();

        assert!(matches!(err, StorageError::StaleWrite { .. }));
        assert_eq!(stored_files(&storage, candidate.id), 1);
        assert_eq!(storage.download_document(&kept).unwrap(), b"cv");
    }
}

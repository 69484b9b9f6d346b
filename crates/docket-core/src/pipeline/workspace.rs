//! On-disk document locations and the moves between them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DocketError, Result};
use crate::models::{Location, StorageConfig};

const MAX_FILENAME_LEN: usize = 100;

/// Reduce an uploaded file name to a safe document key.
///
/// Keeps ASCII letters, digits and `-_.() `, turns spaces into underscores,
/// drops leading dots and truncates to 100 characters. Returns `None` when
/// nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-_.() ".contains(*c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();

    let cleaned: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect();

    (!cleaned.is_empty()).then_some(cleaned)
}

/// The document directories under the data root.
#[derive(Debug, Clone)]
pub struct Workspace {
    incoming: PathBuf,
    processed: PathBuf,
    unprocessed: PathBuf,
    staging: PathBuf,
    text: PathBuf,
}

impl Workspace {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            incoming: storage.incoming_dir(),
            processed: storage.processed_dir(),
            unprocessed: storage.unprocessed_dir(),
            staging: storage.staging_dir(),
            text: storage.text_dir(),
        }
    }

    /// Create every directory.
    pub fn ensure(&self) -> io::Result<()> {
        for dir in [&self.incoming, &self.processed, &self.unprocessed, &self.staging, &self.text] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn dir(&self, location: Location) -> &Path {
        match location {
            Location::Incoming => &self.incoming,
            Location::Processed => &self.processed,
            Location::Unprocessed => &self.unprocessed,
        }
    }

    pub fn path(&self, location: Location, filename: &str) -> PathBuf {
        self.dir(location).join(filename)
    }

    pub fn staged_path(&self, filename: &str) -> PathBuf {
        self.staging.join(filename)
    }

    pub fn text_path(&self, filename: &str) -> PathBuf {
        self.text.join(format!("{}.txt", filename))
    }

    /// Where `filename` currently lives, if anywhere.
    pub fn locate(&self, filename: &str) -> Option<Location> {
        Location::ALL
            .into_iter()
            .find(|&location| self.path(location, filename).is_file())
    }

    /// Document names in `location`, sorted.
    pub fn list(&self, location: Location) -> io::Result<Vec<String>> {
        list_files(self.dir(location))
    }

    /// Copy `source` into `incoming` under its sanitized name.
    ///
    /// Copies of the same name in other locations are removed so the
    /// document has exactly one location afterwards.
    pub fn ingest(&self, source: &Path) -> Result<String> {
        let original = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocketError::NotFound(source.display().to_string()))?;
        let filename = sanitize_filename(original).ok_or_else(|| {
            DocketError::Config(format!("file name {:?} has no usable characters", original))
        })?;

        self.ensure()?;
        for location in [Location::Processed, Location::Unprocessed] {
            remove_if_exists(&self.path(location, &filename))?;
        }
        remove_if_exists(&self.text_path(&filename))?;

        let tmp = self.incoming.join(format!(".{}.tmp", filename));
        fs::copy(source, &tmp)?;
        fs::rename(&tmp, self.path(Location::Incoming, &filename))?;

        debug!("Ingested {} as {}", source.display(), filename);
        Ok(filename)
    }

    /// Move a document between two locations.
    pub fn relocate(&self, filename: &str, from: Location, to: Location) -> io::Result<()> {
        fs::rename(self.path(from, filename), self.path(to, filename))
    }

    /// Move a document from `from` into staging.
    pub fn stage(&self, filename: &str, from: Location) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.staging)?;
        let staged = self.staged_path(filename);
        fs::rename(self.path(from, filename), &staged)?;
        Ok(staged)
    }

    /// Move a staged document into `to`.
    pub fn unstage(&self, filename: &str, to: Location) -> io::Result<()> {
        fs::rename(self.staged_path(filename), self.path(to, filename))
    }

    /// Store the raw text produced for `filename`.
    pub fn write_text(&self, filename: &str, text: &str) -> io::Result<()> {
        fs::create_dir_all(&self.text)?;
        fs::write(self.text_path(filename), text)
    }

    /// Remove every copy of `filename` and its cached text.
    ///
    /// Returns whether a document file existed.
    pub fn remove(&self, filename: &str) -> io::Result<bool> {
        let mut removed = false;
        for location in Location::ALL {
            removed |= remove_if_exists(&self.path(location, filename))?;
        }
        removed |= remove_if_exists(&self.staged_path(filename))?;
        remove_if_exists(&self.text_path(filename))?;
        Ok(removed)
    }

    /// Remove every document and cached text. Returns the number of documents.
    pub fn clear(&self) -> io::Result<usize> {
        let mut count = 0;
        for dir in [&self.incoming, &self.processed, &self.unprocessed, &self.staging] {
            for name in list_files(dir)? {
                fs::remove_file(dir.join(&name))?;
                count += 1;
            }
        }
        for name in list_files(&self.text)? {
            fs::remove_file(self.text.join(name))?;
        }
        Ok(count)
    }

    /// Move documents left in staging back to `incoming`.
    pub fn recover_staged(&self) -> io::Result<Vec<String>> {
        let names = list_files(&self.staging)?;
        for name in &names {
            let target = self.path(Location::Incoming, name);
            if target.exists() {
                warn!(file = %name, "incoming copy already exists, dropping staged copy");
                fs::remove_file(self.staged_path(name))?;
                continue;
            }
            fs::rename(self.staged_path(name), target)?;
        }
        Ok(names)
    }
}

fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn workspace(root: &Path) -> Workspace {
        let storage = StorageConfig {
            data_dir: root.to_path_buf(),
            ..Default::default()
        };
        let workspace = Workspace::new(&storage);
        workspace.ensure().unwrap();
        workspace
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("ACME invoice (1).pdf").unwrap(), "ACME_invoice_(1).pdf");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "etcpasswd");
        assert_eq!(sanitize_filename("fa/ktura#7.pdf").unwrap(), "faktura7.pdf");
        assert!(sanitize_filename("///").is_none());

        let long = format!("{}.pdf", "a".repeat(150));
        assert_eq!(sanitize_filename(&long).unwrap().len(), 100);
    }

    #[test]
    fn test_ingest_and_locate() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("my invoice.pdf");
        fs::write(&source, b"%PDF-1.4").unwrap();
        let ws = workspace(&root.path().join("data"));

        let name = ws.ingest(&source).unwrap();
        assert_eq!(name, "my_invoice.pdf");
        assert_eq!(ws.locate(&name), Some(Location::Incoming));
        assert_eq!(ws.list(Location::Incoming).unwrap(), vec![name]);
    }

    #[test]
    fn test_reingest_replaces_other_locations() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("a.pdf");
        fs::write(&source, b"%PDF-1.4").unwrap();
        let ws = workspace(&root.path().join("data"));

        ws.ingest(&source).unwrap();
        ws.relocate("a.pdf", Location::Incoming, Location::Unprocessed).unwrap();
        ws.ingest(&source).unwrap();

        assert_eq!(ws.locate("a.pdf"), Some(Location::Incoming));
        assert!(ws.list(Location::Unprocessed).unwrap().is_empty());
    }

    #[test]
    fn test_stage_unstage() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        fs::write(ws.path(Location::Incoming, "a.pdf"), b"x").unwrap();

        let staged = ws.stage("a.pdf", Location::Incoming).unwrap();
        assert!(staged.is_file());
        assert_eq!(ws.locate("a.pdf"), None);

        ws.unstage("a.pdf", Location::Processed).unwrap();
        assert_eq!(ws.locate("a.pdf"), Some(Location::Processed));
    }

    #[test]
    fn test_recover_staged() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        fs::write(ws.path(Location::Incoming, "a.pdf"), b"x").unwrap();
        ws.stage("a.pdf", Location::Incoming).unwrap();

        assert_eq!(ws.recover_staged().unwrap(), vec!["a.pdf"]);
        assert_eq!(ws.locate("a.pdf"), Some(Location::Incoming));
    }

    #[test]
    fn test_remove_and_clear() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        fs::write(ws.path(Location::Unprocessed, "a.pdf"), b"x").unwrap();
        fs::write(ws.path(Location::Processed, "b.pdf"), b"x").unwrap();
        ws.write_text("a.pdf", "text").unwrap();

        assert!(ws.remove("a.pdf").unwrap());
        assert!(!ws.text_path("a.pdf").exists());
        assert!(!ws.remove("a.pdf").unwrap());

        assert_eq!(ws.clear().unwrap(), 1);
        assert_eq!(ws.locate("b.pdf"), None);
    }
}

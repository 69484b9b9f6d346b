//! Filesystem-backed template store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::ExtractionTemplate;
use crate::error::TemplateError;

type Result<T> = std::result::Result<T, TemplateError>;

const EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Templates persisted as YAML files in one directory, keyed by file stem.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Create a store for `dir`, creating the directory when missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !dir.exists() {
            if let Err(e) = fs::create_dir_all(&dir) {
                warn!(path = %dir.display(), error = %e, "failed to create template directory");
            }
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all persisted templates, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_yaml && !stem.starts_with('.') {
                names.push(stem.to_string());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Load a template by name. `name` may carry its extension.
    pub fn load(&self, name: &str) -> Result<ExtractionTemplate> {
        let name = strip_extension(name);
        validate_name(name)?;

        let path = self
            .candidate_paths(name)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        let content = fs::read_to_string(&path)?;
        let template = serde_yaml::from_str(&content).map_err(|source| TemplateError::Parse {
            name: name.to_string(),
            source,
        })?;
        debug!("Loaded template {} from {}", name, path.display());
        Ok(template)
    }

    /// Persist a template, replacing any existing one with the same name.
    pub fn save(&self, name: &str, template: &ExtractionTemplate) -> Result<PathBuf> {
        let name = strip_extension(name);
        validate_name(name)?;

        let content = serde_yaml::to_string(template).map_err(|source| TemplateError::Serialize {
            name: name.to_string(),
            source,
        })?;

        fs::create_dir_all(&self.dir)?;

        // An existing `.yaml` spelling would shadow nothing but confuse editors
        let alternate = self.dir.join(format!("{}.yaml", name));
        if alternate.is_file() {
            fs::remove_file(&alternate)?;
        }

        let path = self.dir.join(format!("{}.yml", name));
        let tmp = self.dir.join(format!(".{}.yml.tmp", name));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        info!(template = %name, path = %path.display(), "saved template");
        Ok(path)
    }

    /// Every template that parses. Broken files are logged and skipped.
    pub fn load_all(&self) -> Result<Vec<(String, ExtractionTemplate)>> {
        let mut templates = Vec::new();
        for name in self.list()? {
            match self.load(&name) {
                Ok(template) => templates.push((name, template)),
                Err(e) => warn!(template = %name, error = %e, "skipping unreadable template"),
            }
        }
        Ok(templates)
    }

    fn candidate_paths(&self, name: &str) -> Vec<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .collect()
    }
}

fn strip_extension(name: &str) -> &str {
    EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(&format!(".{}", ext)))
        .unwrap_or(name)
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(TemplateError::InvalidName(name.to_string()));
    }
    Ok(())
}

//! Message catalogs keyed by the English source text.
//!
//! Each language lives in `<dir>/<lang>.yaml` as a flat `msgid: translation`
//! map. Lookups go through a [`Localizer`] bound to one language, so callers
//! pick the locale explicitly instead of relying on ambient request state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    languages: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `*.yaml` file in `dir`. A missing directory yields an empty
    /// catalog (English only).
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "locale directory not found; using source strings");
            return Ok(catalog);
        }
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let lang = lang.to_ascii_lowercase();
            let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let entries: HashMap<String, String> =
                serde_yaml::from_str(&content).map_err(|source| CatalogError::Parse {
                    path: path.clone(),
                    source,
                })?;
            debug!(lang = %lang, count = entries.len(), "loaded translations");
            catalog.languages.insert(lang, entries);
        }
        Ok(catalog)
    }

    /// Add or replace one language from a YAML document.
    pub fn insert_yaml(&mut self, lang: &str, yaml: &str) -> Result<(), serde_yaml::Error> {
        let entries: HashMap<String, String> = serde_yaml::from_str(yaml)?;
        self.languages.insert(lang.to_ascii_lowercase(), entries);
        Ok(())
    }

    pub fn localizer(&self, lang: &str) -> Localizer<'_> {
        let tag = lang.trim().to_ascii_lowercase().replace('_', "-");
        let entries = self.languages.get(&tag).or_else(|| {
            let base = tag.split('-').next()?;
            self.languages.get(base)
        });
        Localizer { entries }
    }
}

/// Translation lookups for a single language.
#[derive(Debug, Clone, Copy)]
pub struct Localizer<'c> {
    entries: Option<&'c HashMap<String, String>>,
}

impl<'c> Localizer<'c> {
    /// A localizer that always returns the source text.
    pub fn source() -> Localizer<'static> {
        Localizer { entries: None }
    }

    pub fn gettext<'s>(&'s self, msgid: &'s str) -> &'s str {
        self.entries
            .and_then(|entries| entries.get(msgid))
            .map(String::as_str)
            .unwrap_or(msgid)
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("hardcoded placeholder regex"));

/// Replace `{name}` placeholders with their values. Unknown names stay as-is.
pub fn fill(template: &str, args: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            args.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

//! Language name catalog: maps language codes to human-readable names.
//!
//! The backing table is loaded lazily on first lookup and at most once per
//! catalog instance. Share one instance per process through an `Arc`; the
//! load is guarded by a `OnceLock`, so concurrent first lookups observe
//! either no table or the fully published one.
//!
//! Lookups never fail. A missing, malformed or empty table puts the catalog
//! in degraded mode, where every lookup returns the input code unchanged.

use crate::locale::language_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Table bundled with the crate.
const EMBEDDED_TABLE: &str = include_str!("../../data/lang_codes.json");

/// Top-level member a table source uses to report that it is unusable.
const ERROR_MEMBER: &str = "error";

/// Display names of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageNames {
    /// Name of the language in that language (e.g., "Deutsch")
    pub native: String,

    /// Name of the language in English (e.g., "German")
    #[serde(rename = "int")]
    pub international: String,
}

impl LanguageNames {
    pub fn new(native: impl Into<String>, international: impl Into<String>) -> Self {
        Self {
            native: native.into(),
            international: international.into(),
        }
    }

    pub fn get(&self, part: NamePart) -> &str {
        match part {
            NamePart::Native => &self.native,
            NamePart::International => &self.international,
        }
    }
}

/// Language key (e.g., "en") → names.
pub type CatalogTable = HashMap<String, LanguageNames>;

/// Host hook that rewrites the table after it is parsed.
pub type TableTransform = Box<dyn Fn(CatalogTable) -> CatalogTable + Send + Sync>;

/// Which name to return from a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamePart {
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "int")]
    International,
}

impl FromStr for NamePart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(NamePart::Native),
            "int" | "international" => Ok(NamePart::International),
            other => Err(format!("Unknown name part: '{}'", other)),
        }
    }
}

/// Where the table is read from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// The table shipped in `data/lang_codes.json`
    Embedded,
    /// A JSON file on disk, read on first lookup
    File(PathBuf),
    /// Raw JSON text
    Json(String),
}

/// Why the catalog is running degraded.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read language table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("language table is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("language table reported an error: {0}")]
    Reported(String),

    #[error("language table is empty")]
    Empty,
}

enum CatalogState {
    Loaded(CatalogTable),
    Degraded(CatalogError),
}

pub struct LanguageNameCatalog {
    source: CatalogSource,
    transform: Option<TableTransform>,
    state: OnceLock<CatalogState>,
}

impl LanguageNameCatalog {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            transform: None,
            state: OnceLock::new(),
        }
    }

    /// Catalog over the bundled table.
    pub fn embedded() -> Self {
        Self::new(CatalogSource::Embedded)
    }

    /// Install a hook that may add, replace or drop entries.
    ///
    /// Runs once, right after a successful parse and before the table becomes
    /// visible to lookups. It is not called in degraded mode.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(CatalogTable) -> CatalogTable + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Look up a display name for `code`.
    ///
    /// The key is the lower-cased language part of the code (`en_US` → `en`).
    /// Returns `code` unchanged when the key is unknown or the catalog is degraded.
    pub fn lookup(&self, code: &str, part: NamePart) -> String {
        match self.table() {
            Some(table) => table
                .get(&language_key(code))
                .map(|names| names.get(part).to_string())
                .unwrap_or_else(|| code.to_string()),
            None => code.to_string(),
        }
    }

    pub fn lookup_native(&self, code: &str) -> String {
        self.lookup(code, NamePart::Native)
    }

    pub fn lookup_international(&self, code: &str) -> String {
        self.lookup(code, NamePart::International)
    }

    /// Whether the table failed to load. Forces the load.
    pub fn is_degraded(&self) -> bool {
        self.table().is_none()
    }

    /// Cause of degraded mode, if any. Forces the load.
    pub fn load_error(&self) -> Option<&CatalogError> {
        match self.state() {
            CatalogState::Degraded(err) => Some(err),
            CatalogState::Loaded(_) => None,
        }
    }

    /// Number of languages in the loaded table (0 when degraded).
    pub fn len(&self) -> usize {
        self.table().map(HashMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> Option<&CatalogTable> {
        match self.state() {
            CatalogState::Loaded(table) => Some(table),
            CatalogState::Degraded(_) => None,
        }
    }

    fn state(&self) -> &CatalogState {
        self.state.get_or_init(|| match self.load() {
            Ok(table) => {
                debug!("Loaded language table with {} entries", table.len());
                CatalogState::Loaded(table)
            }
            Err(e) => {
                warn!("Language names unavailable, showing raw codes: {}", e);
                CatalogState::Degraded(e)
            }
        })
    }

    fn load(&self) -> Result<CatalogTable, CatalogError> {
        let table = match &self.source {
            CatalogSource::Embedded => parse_table(EMBEDDED_TABLE)?,
            CatalogSource::Json(text) => parse_table(text)?,
            CatalogSource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })?;
                parse_table(&text)?
            }
        };

        Ok(match &self.transform {
            Some(transform) => transform(table),
            None => table,
        })
    }
}

impl Default for LanguageNameCatalog {
    fn default() -> Self {
        Self::embedded()
    }
}

impl std::fmt::Debug for LanguageNameCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageNameCatalog")
            .field("source", &self.source)
            .field("has_transform", &self.transform.is_some())
            .field("loaded", &self.state.get().is_some())
            .finish()
    }
}

/// Parse a JSON table of the form `{"en": {"native": "...", "int": "..."}}`.
///
/// A non-empty top-level `"error"` member marks the whole table as unusable;
/// an empty one is ignored.
fn parse_table(text: &str) -> Result<CatalogTable, CatalogError> {
    let mut members: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;

    if let Some(reported) = members.remove(ERROR_MEMBER) {
        if is_set(&reported) {
            let message = match reported {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return Err(CatalogError::Reported(message));
        }
    }

    let table: CatalogTable = serde_json::from_value(serde_json::Value::Object(members))?;
    if table.is_empty() {
        return Err(CatalogError::Empty);
    }

    Ok(table)
}

fn is_set(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

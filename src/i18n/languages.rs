//! Available languages: the locale codes a user may switch to.
//!
//! The host reports what it has installed through a [`LanguageSource`];
//! [`AvailableLanguagesProvider`] adds the baseline locale so there is always
//! at least one choice.

use crate::locale::LocaleCode;
use std::path::PathBuf;
use tracing::debug;

/// Extension of installed translation files.
const TRANSLATION_EXTENSION: &str = "mo";

/// File name prefixes of auxiliary translation files that are not languages.
const AUXILIARY_PREFIXES: [&str; 2] = ["continents-cities", "admin-"];

/// Host collaborator listing installed/enabled locales in host order.
pub trait LanguageSource: Send + Sync {
    fn list(&self) -> Vec<LocaleCode>;
}

/// A fixed list of locales, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticLanguages(pub Vec<LocaleCode>);

impl StaticLanguages {
    /// Parse a comma-separated list, skipping blank items.
    pub fn from_list(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(LocaleCode::from)
                .collect(),
        )
    }
}

impl LanguageSource for StaticLanguages {
    fn list(&self) -> Vec<LocaleCode> {
        self.0.clone()
    }
}

/// Locales installed as `<code>.mo` files in a translations directory.
///
/// The directory is read on every call, so newly installed languages show up
/// without a restart.
#[derive(Debug, Clone)]
pub struct DirectoryLanguages {
    dir: PathBuf,
}

impl DirectoryLanguages {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LanguageSource for DirectoryLanguages {
    fn list(&self) -> Vec<LocaleCode> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read languages dir {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut codes: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == TRANSLATION_EXTENSION)
                    .unwrap_or(false)
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .filter(|stem| {
                !stem.is_empty()
                    && !AUXILIARY_PREFIXES
                        .iter()
                        .any(|prefix| stem.starts_with(prefix))
            })
            .collect();

        codes.sort();
        codes.into_iter().map(LocaleCode::from).collect()
    }
}

/// Host hook that rewrites the installed language list.
pub type LanguageListTransform = Box<dyn Fn(Vec<LocaleCode>) -> Vec<LocaleCode> + Send + Sync>;

/// Installed languages plus the baseline locale.
pub struct AvailableLanguagesProvider {
    source: Box<dyn LanguageSource>,
    baseline: LocaleCode,
    transform: Option<LanguageListTransform>,
}

impl AvailableLanguagesProvider {
    pub fn new(source: impl LanguageSource + 'static, baseline: impl Into<LocaleCode>) -> Self {
        Self {
            source: Box::new(source),
            baseline: baseline.into(),
            transform: None,
        }
    }

    /// Install a hook applied to the host's list before the baseline is added.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<LocaleCode>) -> Vec<LocaleCode> + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn baseline(&self) -> &LocaleCode {
        &self.baseline
    }

    /// Selectable locales in host order, baseline appended if missing.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn available(&self) -> Vec<LocaleCode> {
        let mut listed = self.source.list();
        if let Some(transform) = &self.transform {
            listed = transform(listed);
        }
        listed.push(self.baseline.clone());

        let mut available: Vec<LocaleCode> = Vec::with_capacity(listed.len());
        for code in listed {
            if !code.is_empty() && !available.contains(&code) {
                available.push(code);
            }
        }
        available
    }
}

impl std::fmt::Debug for AvailableLanguagesProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailableLanguagesProvider")
            .field("baseline", &self.baseline)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

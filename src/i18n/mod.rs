//! Language metadata: display names and the set of selectable languages.
//!
//! # Architecture
//!
//! - `catalog`: code → native/international name lookup over a lazily loaded table
//! - `languages`: installed languages from the host, plus the baseline locale
//!
//! # Example
//!
//! ```rust,ignore
//! use user_lang_switch::i18n::{LanguageNameCatalog, NamePart};
//!
//! let catalog = LanguageNameCatalog::embedded();
//! assert_eq!(catalog.lookup("de_DE", NamePart::Native), "Deutsch");
//! assert_eq!(catalog.lookup("xx_YY", NamePart::Native), "xx_YY");
//! ```

mod catalog;
mod languages;

pub use catalog::{
    CatalogError, CatalogSource, CatalogTable, LanguageNameCatalog, LanguageNames, NamePart,
    TableTransform,
};
pub use languages::{
    AvailableLanguagesProvider, DirectoryLanguages, LanguageListTransform, LanguageSource,
    StaticLanguages,
};

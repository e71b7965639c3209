//! Per-user display language switching.
//!
//! A request's locale is the user's stored preference, else the host default.
//! A one-shot request parameter persists a new preference before resolution,
//! and the picker lists the other available languages with their names and
//! activation links.

pub mod config;
pub mod db;
pub mod i18n;
pub mod locale;
pub mod overrides;
pub mod picker;
pub mod resolver;
pub mod retry;
pub mod server;
pub mod session;
pub mod store;

pub use i18n::{AvailableLanguagesProvider, LanguageNameCatalog, NamePart};
pub use locale::{LocaleCode, UserIdentity};
pub use overrides::{OverrideApplier, RequestParams};
pub use picker::{LanguagePicker, LanguagePickerBuilder, PickerEntry};
pub use resolver::LocaleResolver;
pub use session::{LocaleSession, SessionSettings};
pub use store::{MemoryStore, PreferenceStore, StoreError};

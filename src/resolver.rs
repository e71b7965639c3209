//! Effective locale resolution: stored user preference, else host default.

use crate::locale::{LocaleCode, UserIdentity};
use crate::store::{with_timeout, PreferenceStore};
use std::time::Duration;
use tracing::{debug, warn};

/// Default upper bound for a preference read.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct LocaleResolver {
    timeout: Duration,
}

impl LocaleResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Resolve the locale for `user`.
    ///
    /// A non-empty stored preference wins; anything else (anonymous caller,
    /// no preference, empty value, store error or timeout) yields `default_locale`.
    pub async fn resolve(
        &self,
        default_locale: &LocaleCode,
        user: &UserIdentity,
        store: &dyn PreferenceStore,
    ) -> LocaleCode {
        let Some(user_id) = user.key() else {
            return default_locale.clone();
        };

        match with_timeout(self.timeout, store.get(user_id)).await {
            Ok(Some(stored)) if !stored.is_empty() => LocaleCode::from(stored),
            Ok(_) => {
                debug!("No language preference for {}, using {}", user, default_locale);
                default_locale.clone()
            }
            Err(e) => {
                warn!("Reading language preference for {} failed, using {}: {}", user, default_locale, e);
                default_locale.clone()
            }
        }
    }
}

impl Default for LocaleResolver {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_TIMEOUT)
    }
}

//! Per-request locale handling: apply a pending override, then resolve.

use crate::locale::{LocaleCode, UserIdentity};
use crate::overrides::{OverrideApplier, RequestParams, DEFAULT_OVERRIDE_PARAM};
use crate::resolver::{LocaleResolver, DEFAULT_STORE_TIMEOUT};
use crate::store::PreferenceStore;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide settings shared by every request.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub override_param: String,
    pub store_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            override_param: DEFAULT_OVERRIDE_PARAM.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Locale state of one request.
///
/// The override is written before the first resolution, so a switch is
/// visible within the same request. Resolving again never re-applies it.
pub struct LocaleSession {
    user: UserIdentity,
    params: RequestParams,
    store: Arc<dyn PreferenceStore>,
    resolver: LocaleResolver,
    applier: OverrideApplier,
}

impl LocaleSession {
    pub fn new(
        user: UserIdentity,
        params: RequestParams,
        store: Arc<dyn PreferenceStore>,
        settings: &SessionSettings,
    ) -> Self {
        Self {
            user,
            params,
            store,
            resolver: LocaleResolver::new(settings.store_timeout),
            applier: OverrideApplier::new(settings.override_param.clone())
                .with_timeout(settings.store_timeout),
        }
    }

    /// Whether this request's override has been persisted.
    pub fn override_applied(&self) -> bool {
        self.applier.is_applied()
    }

    /// Effective locale for this request, given the host default.
    pub async fn effective_locale(&mut self, default_locale: &LocaleCode) -> LocaleCode {
        self.applier
            .apply_if_requested(&self.params, &self.user, self.store.as_ref())
            .await;
        self.resolver
            .resolve(default_locale, &self.user, self.store.as_ref())
            .await
    }
}

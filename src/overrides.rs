//! One-shot language override: persists a locale requested through the
//! override parameter, at most once per request.

use crate::locale::UserIdentity;
use crate::resolver::DEFAULT_STORE_TIMEOUT;
use crate::store::{with_timeout, PreferenceStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Request parameter carrying the locale to switch to.
pub const DEFAULT_OVERRIDE_PARAM: &str = "user_lang";

/// Query/form parameters of the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(HashMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl From<HashMap<String, String>> for RequestParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverrideState {
    Pending,
    Applied,
}

/// Request-scoped override guard.
///
/// Create one per request. After the first successful write every further
/// call is a no-op, whatever parameters it is given.
#[derive(Debug, Clone)]
pub struct OverrideApplier {
    param: String,
    timeout: Duration,
    state: OverrideState,
}

impl OverrideApplier {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            timeout: DEFAULT_STORE_TIMEOUT,
            state: OverrideState::Pending,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_applied(&self) -> bool {
        self.state == OverrideState::Applied
    }

    /// Override value present in `params`, if any.
    pub fn requested<'p>(&self, params: &'p RequestParams) -> Option<&'p str> {
        params.get(&self.param)
    }

    /// Persist the requested locale for `user`.
    ///
    /// Returns `true` only when this call wrote the preference. Nothing is
    /// written when the parameter is absent, the caller is anonymous, the
    /// override already fired in this request, or the store fails. A failed
    /// write leaves the guard pending.
    ///
    /// The value is stored as given; an empty value clears the preference in
    /// effect, since resolution ignores empty preferences.
    pub async fn apply_if_requested(
        &mut self,
        params: &RequestParams,
        user: &UserIdentity,
        store: &dyn PreferenceStore,
    ) -> bool {
        if self.is_applied() {
            return false;
        }

        let Some(value) = self.requested(params) else {
            return false;
        };

        let Some(user_id) = user.key() else {
            debug!("Ignoring language override '{}' from anonymous caller", value);
            return false;
        };

        match with_timeout(self.timeout, store.set(user_id, value)).await {
            Ok(()) => {
                self.state = OverrideState::Applied;
                info!("Language preference for {} set to '{}'", user, value);
                true
            }
            Err(e) => {
                warn!("Could not save language preference for {}: {}", user, e);
                false
            }
        }
    }
}

impl Default for OverrideApplier {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_PARAM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn user(id: &str) -> UserIdentity {
        UserIdentity::User(id.to_string())
    }

    fn override_to(code: &str) -> RequestParams {
        RequestParams::new().with(DEFAULT_OVERRIDE_PARAM, code)
    }

    // ==================== Basic Application Tests ====================

    #[tokio::test]
    async fn test_absent_param_is_noop() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();

        let params = RequestParams::new().with("page", "2");
        assert!(!applier.apply_if_requested(&params, &user("u1"), &store).await);
        assert_eq!(store.write_count(), 0);
        assert!(!applier.is_applied());
    }

    #[tokio::test]
    async fn test_present_param_persists() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();

        assert!(applier.apply_if_requested(&override_to("fr_FR"), &user("u1"), &store).await);
        assert_eq!(store.stored("u1"), Some("fr_FR".to_string()));
        assert!(applier.is_applied());
    }

    #[tokio::test]
    async fn test_custom_param_name() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::new("lang");

        let params = RequestParams::new().with("lang", "de_DE").with(DEFAULT_OVERRIDE_PARAM, "fr_FR");
        assert!(applier.apply_if_requested(&params, &user("u1"), &store).await);
        assert_eq!(store.stored("u1"), Some("de_DE".to_string()));
    }

    #[tokio::test]
    async fn test_value_stored_verbatim() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();

        assert!(applier.apply_if_requested(&override_to("zh_Hant_TW"), &user("u1"), &store).await);
        assert_eq!(store.stored("u1"), Some("zh_Hant_TW".to_string()));
    }

    #[tokio::test]
    async fn test_empty_value_is_written() {
        let store = MemoryStore::new();
        store.set("u1", "fr_FR").await.unwrap();
        let mut applier = OverrideApplier::default();

        assert!(applier.apply_if_requested(&override_to(""), &user("u1"), &store).await);
        assert_eq!(store.stored("u1"), Some(String::new()));
    }

    // ==================== One-Shot Guard Tests ====================

    #[tokio::test]
    async fn test_second_call_same_request_is_noop() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();
        let params = override_to("fr_FR");

        assert!(applier.apply_if_requested(&params, &user("u1"), &store).await);
        assert!(!applier.apply_if_requested(&params, &user("u1"), &store).await);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_second_call_with_different_value_keeps_first() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();

        assert!(applier.apply_if_requested(&override_to("fr_FR"), &user("u1"), &store).await);
        assert!(!applier.apply_if_requested(&override_to("de_DE"), &user("u1"), &store).await);
        assert_eq!(store.stored("u1"), Some("fr_FR".to_string()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_new_request_applies_again() {
        let store = MemoryStore::new();

        let mut first = OverrideApplier::default();
        assert!(first.apply_if_requested(&override_to("fr_FR"), &user("u1"), &store).await);

        let mut second = OverrideApplier::default();
        assert!(second.apply_if_requested(&override_to("de_DE"), &user("u1"), &store).await);
        assert_eq!(store.stored("u1"), Some("de_DE".to_string()));
    }

    #[tokio::test]
    async fn test_noop_call_does_not_consume_guard() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();

        assert!(!applier.apply_if_requested(&RequestParams::new(), &user("u1"), &store).await);
        assert!(applier.apply_if_requested(&override_to("es_ES"), &user("u1"), &store).await);
    }

    // ==================== Anonymous & Failure Tests ====================

    #[tokio::test]
    async fn test_anonymous_is_ignored() {
        let store = MemoryStore::new();
        let mut applier = OverrideApplier::default();

        assert!(
            !applier
                .apply_if_requested(&override_to("fr_FR"), &UserIdentity::Anonymous, &store)
                .await
        );
        assert_eq!(store.write_count(), 0);
        assert!(!applier.is_applied());
    }

    #[tokio::test]
    async fn test_store_failure_skips_and_stays_pending() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let mut applier = OverrideApplier::default();

        assert!(!applier.apply_if_requested(&override_to("fr_FR"), &user("u1"), &store).await);
        assert!(!applier.is_applied());

        store.set_failing(false);
        assert!(applier.apply_if_requested(&override_to("fr_FR"), &user("u1"), &store).await);
        assert_eq!(store.write_count(), 1);
    }

    // ==================== RequestParams Tests ====================

    #[test]
    fn test_request_params_deserialize_from_map() {
        let params: RequestParams =
            serde_json::from_str(r#"{"user_lang": "it_IT", "x": "1"}"#).unwrap();
        assert_eq!(params.get("user_lang"), Some("it_IT"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_requested_reads_configured_param() {
        let applier = OverrideApplier::new("lang");
        let params = RequestParams::new().with("lang", "nl_NL");
        assert_eq!(applier.requested(&params), Some("nl_NL"));
        assert_eq!(OverrideApplier::default().requested(&params), None);
    }
}

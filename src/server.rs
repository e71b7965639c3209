//! HTTP surface: locale resolution and the language menu for the host UI.

use crate::config::Config;
use crate::db::Database;
use crate::i18n::{
    AvailableLanguagesProvider, CatalogSource, DirectoryLanguages, LanguageNameCatalog,
    StaticLanguages,
};
use crate::locale::{LocaleCode, UserIdentity};
use crate::overrides::RequestParams;
use crate::picker::{LanguagePickerBuilder, PickerEntry};
use crate::session::{LocaleSession, SessionSettings};
use crate::store::{MemoryStore, PreferenceStore};
use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri, Query, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Header carrying the authenticated user id, set by the host's auth layer.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PreferenceStore>,
    pub picker: LanguagePickerBuilder,
    pub settings: SessionSettings,
    pub default_locale: LocaleCode,
}

impl AppState {
    /// Wire catalog, language source and preference store from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.lang_codes_path {
            Some(path) => LanguageNameCatalog::new(CatalogSource::File(PathBuf::from(path))),
            None => LanguageNameCatalog::embedded(),
        };
        if let Some(err) = catalog.load_error() {
            warn!("Language menu will show raw codes: {}", err);
        } else {
            info!("✓ Language table loaded ({} languages)", catalog.len());
        }

        let languages = match &config.languages_dir {
            Some(dir) => {
                info!("Reading installed languages from {}", dir);
                AvailableLanguagesProvider::new(DirectoryLanguages::new(dir), config.baseline_locale.as_str())
            }
            None => AvailableLanguagesProvider::new(
                StaticLanguages(
                    config
                        .available_languages
                        .iter()
                        .map(|code| LocaleCode::from(code.as_str()))
                        .collect(),
                ),
                config.baseline_locale.as_str(),
            ),
        };
        info!("Baseline locale {} is always selectable", languages.baseline());

        let store: Arc<dyn PreferenceStore> = match &config.database_url {
            Some(url) => Arc::new(
                Database::new(url, &config.preference_key)
                    .await
                    .context("Failed to initialize preference store")?,
            ),
            None => {
                warn!("DATABASE_URL not set, preferences are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        let settings = SessionSettings {
            override_param: config.override_param.clone(),
            store_timeout: config.store_timeout,
        };

        Ok(Self {
            store,
            picker: LanguagePickerBuilder::new(
                Arc::new(catalog),
                Arc::new(languages),
                config.override_param.clone(),
            ),
            settings,
            default_locale: LocaleCode::from(config.default_locale.as_str()),
        })
    }

    fn session(&self, user: UserIdentity, params: RequestParams) -> LocaleSession {
        LocaleSession::new(user, params, Arc::clone(&self.store), &self.settings)
    }
}

/// Caller identity taken from [`USER_HEADER`]; never rejects.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(CurrentUser(UserIdentity::from_raw(raw)))
    }
}

#[derive(Debug, Serialize)]
pub struct LocaleResponse {
    pub locale: LocaleCode,
    pub override_applied: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub current: LocaleCode,
    pub current_label: String,
    pub entries: Vec<PickerEntry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locale", get(locale))
        .route("/languages", get(languages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn locale(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<RequestParams>,
) -> Json<LocaleResponse> {
    let mut session = state.session(user, params);
    let locale = session.effective_locale(&state.default_locale).await;

    Json(LocaleResponse {
        locale,
        override_applied: session.override_applied(),
    })
}

async fn languages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<RequestParams>,
) -> Json<LanguagesResponse> {
    let mut session = state.session(user, params);
    let current = session.effective_locale(&state.default_locale).await;

    let request_url = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let picker = state.picker.build(&current, request_url);

    Json(LanguagesResponse {
        current_label: picker.current_label(),
        entries: picker.entries(),
        current,
    })
}

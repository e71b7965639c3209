use anyhow::Result;
use tracing::info;
use user_lang_switch::{config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("user_lang_switch=info".parse()?),
        )
        .init();

    info!("Starting user language switch service");

    // Load configuration from environment
    let config = config::Config::from_env()?;
    info!(
        "Default locale {}, baseline {}, override parameter '{}'",
        config.default_locale, config.baseline_locale, config.override_param
    );

    let state = server::AppState::from_config(&config).await?;
    server::serve(state, config.port).await
}

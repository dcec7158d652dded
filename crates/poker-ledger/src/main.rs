mod bootstrap;
mod commands;
mod render;

use anyhow::Result;
use ledger_core::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_preferences();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Poker Ledger v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Period: {}, Timezone: {}, Store: {}",
        settings.period,
        settings.timezone,
        if settings.sync_key.is_some() { "cloud" } else { "local" }
    );

    commands::run(&settings).await
}

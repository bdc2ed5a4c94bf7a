//! QuikSafe bot entry point.

use std::sync::Arc;

use quiksafe::telegram::handlers::{schema, HandlerDeps};
use quiksafe::telegram::{create_bot, setup_bot_commands};
use safecore::ai::GeminiClient;
use safecore::scene::SceneManager;
use safecore::security::{AuthService, CryptoService};
use safecore::session::SessionManager;
use safecore::storage::PgVault;
use safecore::{config, Vault};
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_timed();

    // teloxide reads TELOXIDE_TOKEN; accept TELEGRAM_BOT_TOKEN as an alias
    if std::env::var("TELOXIDE_TOKEN").is_err() {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            // Safety: single-threaded at this point, before the runtime
            // spawns any worker that could read the environment.
            std::env::set_var("TELOXIDE_TOKEN", token);
        }
    }

    if let Err(reason) = config::validate() {
        log::error!("Configuration error: {}", reason);
        log::error!("Please check your .env file and ensure all required variables are set.");
        anyhow::bail!("invalid configuration: {}", reason);
    }

    log::info!("Starting QuikSafe Bot...");

    // External collaborators
    let vault: Arc<dyn Vault> = Arc::new(PgVault::connect(&config::DATABASE_URL).await?);
    let crypto = Arc::new(CryptoService::from_config()?);
    let auth = Arc::new(AuthService::new());
    let assistant = Arc::new(GeminiClient::from_config()?);

    // Process-wide per-user state, injected rather than global
    let sessions = Arc::new(SessionManager::new());
    let scenes = Arc::new(SceneManager::new());

    let deps = HandlerDeps::new(
        vault,
        crypto,
        auth,
        Arc::clone(&sessions),
        Arc::clone(&scenes),
        assistant,
    );

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    // Sweep abandoned wizards so half-finished flows don't live forever
    let sweep_scenes = Arc::clone(&scenes);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config::scene::sweep_interval());
        loop {
            interval.tick().await;
            let swept = sweep_scenes.sweep_idle(config::scene::idle_ttl());
            if swept > 0 {
                log::info!("Swept {} idle wizard scene(s)", swept);
            }
            quiksafe::telegram::start::sweep_pending_links();
        }
    });

    log::info!("All components initialized successfully");

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

use std::sync::Arc;

use futures::StreamExt;

use sheet_relay::channels::TelegramChannel;
use sheet_relay::config::RelayConfig;
use sheet_relay::dispatch::{Dispatcher, SheetAppender};
use sheet_relay::keepalive::spawn_keep_alive;
use sheet_relay::server::spawn_server;
use sheet_relay::sheets::{DisabledSheets, SheetsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let table = config.category_table().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📨 sheet-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Source chat: {}", config.source_chat);
    eprintln!("   Health: http://0.0.0.0:{}/", config.port);
    for rule in table.rules() {
        eprintln!(
            "   Category {}: {} keyword(s), sheet: {}, forwards: {}",
            rule.id,
            rule.keywords.len(),
            rule.sheet_id.as_deref().unwrap_or("none"),
            rule.forward_to.len(),
        );
    }

    // ── Collaborators ───────────────────────────────────────────────
    let sheets: Arc<dyn SheetAppender> = match config.sheets_token.clone() {
        Some(token) => {
            eprintln!("   Sheets: enabled");
            Arc::new(SheetsClient::new(token))
        }
        None => {
            tracing::warn!("SHEETS_ACCESS_TOKEN not set; rows will not be recorded");
            eprintln!("   Sheets: disabled");
            Arc::new(DisabledSheets)
        }
    };

    let telegram = Arc::new(TelegramChannel::new(
        config.bot_token.clone(),
        config.source_chat,
    ));

    // Fail fast on a bad bot token before anything is spawned.
    telegram.health_check().await?;
    tracing::info!("Telegram credentials verified");

    // ── Liveness surfaces ───────────────────────────────────────────
    let _server = spawn_server(config.port);
    let _keep_alive = spawn_keep_alive(config.service_url.clone());
    if config.service_url.is_none() {
        eprintln!("   Keep-alive: SERVICE_URL not set, self-ping disabled");
    }

    // ── Dispatch loop ───────────────────────────────────────────────
    let dispatcher = Dispatcher::new(table, sheets, telegram.clone(), config.tz);

    let mut messages = telegram.listen();
    tracing::info!("Listening for messages...");

    while let Some(text) = messages.next().await {
        tracing::info!(
            preview = %text.chars().take(80).collect::<String>(),
            "Message received"
        );
        dispatcher.dispatch(&text).await;
    }

    tracing::info!("Message stream closed, shutting down");
    Ok(())
}

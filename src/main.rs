mod config;
mod llm;

use std::net::SocketAddr;
use std::sync::Arc;

use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use config::Config;
use llm::ReplyGenerator;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "arthur.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("arthur.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting arthur...");
    info!("Loaded config from {config_path}");
    info!("Provider: {}", config.provider);

    let bot = Bot::new(&config.telegram_bot_token);
    let generator = Arc::new(ReplyGenerator::new(&config));

    let handler = Update::filter_message().endpoint(handle_message);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![generator])
        .enable_ctrlc_handler()
        .build();

    match config.webhook {
        Some(ref webhook) => {
            info!("Serving webhook updates on port {}", webhook.port);
            let addr = SocketAddr::from(([0, 0, 0, 0], webhook.port));
            let listener = webhooks::axum(bot, webhooks::Options::new(addr, webhook.url.clone()))
                .await
                .expect("Failed to register webhook");
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
                )
                .await;
        }
        None => {
            info!("Long polling for updates");
            dispatcher.dispatch().await;
        }
    }
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    generator: Arc<ReplyGenerator>,
) -> ResponseResult<()> {
    // Service messages (user joined, pinned, stickers, ...) carry no text
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }

    let reply = generator.generate(text).await;

    // Fire-and-forget: a failed send is logged, never retried
    if let Err(e) = bot.send_message(msg.chat.id, &reply).await {
        warn!("Failed to send reply to {}: {e}", msg.chat.id);
        return Ok(());
    }
    info!("[{}] {text} → {reply}", msg.chat.id);

    Ok(())
}

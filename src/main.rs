//! Chatflow - declarative branching chat bot
//!
//! Conversations are JSON-defined graphs of steps. Each inbound message is
//! run through a pure state machine; the runtime performs the resulting
//! actions and replies over the Telegram Bot API.

mod action;
mod config;
mod flow;
mod runtime;
mod session;
mod state_machine;
mod telegram;
mod template;

use action::HttpActionExecutor;
use config::BotConfig;
use runtime::{Dispatcher, ProductionRuntime};
use session::SessionStore;
use std::sync::Arc;
use telegram::{TelegramApi, TelegramTransport, UpdatePoller};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inbound messages buffered between the poller and the dispatcher
const INBOUND_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = BotConfig::from_env()?;

    // Refuse to serve anything from a broken conversation file
    let registry = match flow::load_registry(&config.conversation_file) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!(path = %config.conversation_file.display(), error = %e, "Invalid conversation file");
            return Err(e.into());
        }
    };

    let api =
        TelegramApi::new(&config.api_base, &config.bot_token).with_send_timeout(config.send_timeout);
    let runtime: ProductionRuntime = runtime::FlowRuntime::new(
        registry,
        Arc::new(SessionStore::new()),
        HttpActionExecutor::new(config.action_timeout)?,
        TelegramTransport::new(api.clone()),
    )
    .with_notices(config.notices);

    let shutdown = CancellationToken::new();
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

    let poller = tokio::spawn(
        UpdatePoller::new(api, config.poll_timeout, inbound_tx).run(shutdown.clone()),
    );
    let dispatcher =
        tokio::spawn(Dispatcher::new(Arc::new(runtime), shutdown.clone()).run(inbound_rx));

    tracing::info!(
        action_timeout_secs = config.action_timeout.as_secs(),
        "Chatflow bot started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    shutdown.cancel();

    poller.await?;
    dispatcher.await?;

    Ok(())
}

//! Long-polling receiver for inbound messages

use super::api::{TelegramApi, Update};
use crate::runtime::InboundEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Wait before polling again after a failed `getUpdates`
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Forwards text messages from `getUpdates` to the dispatcher
pub struct UpdatePoller {
    api: TelegramApi,
    poll_timeout: Duration,
    retry_delay: Duration,
    events: mpsc::Sender<InboundEvent>,
}

impl UpdatePoller {
    pub fn new(api: TelegramApi, poll_timeout: Duration, events: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            api,
            poll_timeout,
            retry_delay: RETRY_DELAY,
            events,
        }
    }

    #[cfg(test)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Poll until shutdown is requested or the dispatcher goes away.
    ///
    /// API failures are logged and retried; they never stop the bot.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut offset: Option<i64> = None;
        tracing::info!(poll_timeout_secs = self.poll_timeout.as_secs(), "Polling for updates");

        loop {
            let updates = tokio::select! {
                () = shutdown.cancelled() => break,
                result = self.api.get_updates(offset, self.poll_timeout) => result,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, retrying");
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(self.retry_delay) => continue,
                    }
                }
            };

            for update in updates {
                // Advance the offset so this update is not delivered again
                offset = Some(update.update_id + 1);

                let Some(event) = inbound_event(update) else {
                    continue;
                };
                if self.events.send(event).await.is_err() {
                    tracing::info!("Dispatcher gone, stopping poller");
                    return;
                }
            }
        }

        tracing::info!("Poller stopped");
    }
}

/// Text messages only; everything else is skipped
fn inbound_event(update: Update) -> Option<InboundEvent> {
    let message = update.message?;
    let text = message.text?;
    Some(InboundEvent::new(message.chat.id, text))
}

//! Telegram Bot API transport
//!
//! Outbound messages go through [`TelegramTransport`]; inbound messages are
//! long-polled from `getUpdates` by [`UpdatePoller`] and forwarded over an
//! mpsc channel to the dispatcher.

mod api;
mod poller;
mod transport;

pub use api::TelegramApi;
pub use poller::UpdatePoller;
pub use transport::TelegramTransport;

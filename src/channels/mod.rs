//! Chat channel adapters.

pub mod telegram;

pub use telegram::TelegramChannel;

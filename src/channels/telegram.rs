//! Telegram channel — long-polls the Bot API for new messages.
//!
//! The listener emits the raw text of every message seen in the
//! configured source chat. Forwarding sends the verbatim text as a new
//! message via `sendMessage`, not as a protocol-level forward, so the
//! destination sees a fresh message with no origin attribution.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::dispatch::Forwarder;
use crate::error::ChannelError;
use crate::router::ChatId;

/// Stream of message texts from the source chat.
pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Seconds to wait after a failed poll before retrying.
const POLL_RETRY_SECS: u64 = 5;

/// Long-poll timeout passed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    source_chat: ChatId,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, source_chat: ChatId) -> Self {
        Self {
            bot_token,
            source_chat,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Verify the bot token with getMe. Used at startup to fail fast.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    /// Start the long-poll loop and return a stream of source-chat texts.
    ///
    /// Messages from other chats and non-text updates are skipped. Poll
    /// and parse errors log a warning and retry after a short pause; the
    /// loop only exits when the receiving side is dropped.
    pub fn listen(&self) -> MessageStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let source_chat = self.source_chat;
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!(source_chat, "Telegram channel listening for messages...");

            loop {
                let url = format!("https://api.telegram.org/bot{bot_token}/getUpdates");
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(POLL_RETRY_SECS)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(POLL_RETRY_SECS)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                    for update in results {
                        // Advance offset past this update
                        if let Some(uid) =
                            update.get("update_id").and_then(serde_json::Value::as_i64)
                        {
                            offset = uid + 1;
                        }

                        let Some(message) = update.get("message") else {
                            continue;
                        };

                        let Some(text) = message.get("text").and_then(serde_json::Value::as_str)
                        else {
                            continue;
                        };

                        let chat_id = message
                            .get("chat")
                            .and_then(|c| c.get("id"))
                            .and_then(serde_json::Value::as_i64);

                        if chat_id != Some(source_chat) {
                            continue;
                        }

                        if tx.send(text.to_string()).is_err() {
                            tracing::info!("Telegram listener channel closed");
                            return;
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Box::pin(stream)
    }

    /// Send a plain-text message to a chat.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                destination: chat_id.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                destination: chat_id.to_string(),
                reason: format!("sendMessage returned {status}: {err}"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Forwarder for TelegramChannel {
    async fn forward(&self, chat_id: ChatId, text: &str) -> Result<(), ChannelError> {
        self.send_message(chat_id, text).await
    }
}

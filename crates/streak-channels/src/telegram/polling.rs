//! Long-polling update loop and Channel trait implementation.

use super::types::{TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use streak_core::{
    error::StreakError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, StreakError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let channel = TelegramChannel {
            config: self.config.clone(),
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            last_update_id: self.last_update_id.clone(),
        };

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = channel.last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{}/getUpdates?timeout=30", channel.base_url);
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match channel
                    .client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *channel.last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let incoming = if let Some(query) = update.callback_query {
                        // Answer immediately so the client stops its spinner;
                        // the state machine replies by editing the prompt.
                        channel.answer_callback(&query.id).await;

                        if !channel.sender_allowed(query.from.id) {
                            warn!("ignoring button press from unauthorized user {}", query.from.id);
                            continue;
                        }

                        let data = match query.data {
                            Some(d) => d,
                            None => continue,
                        };
                        let (chat_id, message_id) = match query.message {
                            Some(ref m) => (m.chat.id, Some(m.message_id)),
                            None => (query.from.id, None),
                        };

                        IncomingMessage {
                            id: Uuid::new_v4(),
                            channel: "telegram".to_string(),
                            sender_id: query.from.id.to_string(),
                            sender_name: Some(display_name(&query.from)),
                            text: String::new(),
                            timestamp: chrono::Utc::now(),
                            reply_target: Some(chat_id.to_string()),
                            callback_data: Some(data),
                            message_id,
                        }
                    } else if let Some(msg) = update.message {
                        let text = match msg.text {
                            Some(t) => t,
                            None => continue,
                        };

                        let user = match msg.from {
                            Some(u) => u,
                            None => continue,
                        };

                        if !channel.sender_allowed(user.id) {
                            warn!("ignoring message from unauthorized user {}", user.id);
                            continue;
                        }

                        // Group chats are ignored -- this bot is person-to-person.
                        if matches!(msg.chat.chat_type.as_str(), "group" | "supergroup") {
                            debug!("telegram: ignoring group message from chat {}", msg.chat.id);
                            continue;
                        }

                        IncomingMessage {
                            id: Uuid::new_v4(),
                            channel: "telegram".to_string(),
                            sender_id: user.id.to_string(),
                            sender_name: Some(display_name(&user)),
                            text,
                            timestamp: chrono::Utc::now(),
                            reply_target: Some(msg.chat.id.to_string()),
                            callback_data: None,
                            message_id: Some(msg.message_id),
                        }
                    } else {
                        continue;
                    };

                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), StreakError> {
        let chat_id_str = message
            .reply_target
            .as_deref()
            .ok_or_else(|| StreakError::Channel("no reply_target on outgoing message".into()))?;

        let chat_id: i64 = chat_id_str.parse().map_err(|e| {
            StreakError::Channel(format!("invalid telegram chat_id '{chat_id_str}': {e}"))
        })?;

        if let Some(message_id) = message.edit_message_id {
            return self.edit_text(chat_id, message_id, &message.text).await;
        }
        if let Some(ref buttons) = message.buttons {
            return self.send_buttons(chat_id, &message.text, buttons).await;
        }
        self.send_text(chat_id, &message.text).await
    }

    async fn stop(&self) -> Result<(), StreakError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

impl TelegramChannel {
    /// Whether a sender may talk to this bot: the configured chat's user, or
    /// anyone on the explicit allow-list.
    pub(super) fn sender_allowed(&self, user_id: i64) -> bool {
        if self.config.allowed_users.is_empty() {
            user_id == self.config.chat_id
        } else {
            self.config.allowed_users.contains(&user_id)
        }
    }
}

fn display_name(user: &super::types::TgUser) -> String {
    if let Some(ref un) = user.username {
        format!("@{un}")
    } else if let Some(ref ln) = user.last_name {
        format!("{} {ln}", user.first_name)
    } else {
        user.first_name.clone()
    }
}

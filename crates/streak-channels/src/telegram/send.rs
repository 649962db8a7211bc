//! Outbound Bot API calls: messages, edits, keyboards, command registration.

use super::types::TgResponse;
use super::TelegramChannel;
use serde_json::json;
use streak_core::{error::StreakError, message::Button};
use tracing::warn;

impl TelegramChannel {
    /// POST a Bot API method with a JSON body and check the `ok` flag.
    async fn api_post(&self, method: &str, body: serde_json::Value) -> Result<(), StreakError> {
        let url = format!("{}/{method}", self.base_url);
        let resp: TgResponse<serde_json::Value> = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StreakError::Channel(format!("telegram {method} failed: {e}")))?
            .json()
            .await
            .map_err(|e| StreakError::Channel(format!("telegram {method} parse failed: {e}")))?;

        if !resp.ok {
            return Err(StreakError::Channel(format!(
                "telegram {method} rejected: {}",
                resp.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Send a plain text message.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), StreakError> {
        self.api_post(
            "sendMessage",
            json!({ "chat_id": chat_id, "text": text }),
        )
        .await
    }

    /// Send a message with a single row of inline buttons.
    pub(crate) async fn send_buttons(
        &self,
        chat_id: i64,
        text: &str,
        buttons: &[Button],
    ) -> Result<(), StreakError> {
        let row: Vec<serde_json::Value> = buttons
            .iter()
            .map(|b| json!({ "text": b.label, "callback_data": b.data }))
            .collect();
        self.api_post(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": { "inline_keyboard": [row] },
            }),
        )
        .await
    }

    /// Edit an existing message in place (also clears its inline keyboard).
    pub(crate) async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), StreakError> {
        self.api_post(
            "editMessageText",
            json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
        )
        .await
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub(crate) async fn answer_callback(&self, callback_id: &str) {
        if let Err(e) = self
            .api_post("answerCallbackQuery", json!({ "callback_query_id": callback_id }))
            .await
        {
            warn!("telegram answerCallbackQuery failed: {e}");
        }
    }

    /// Register the bot command menu. Best-effort: a failure is logged, not fatal.
    pub(crate) async fn register_commands(&self) {
        let commands = json!({
            "commands": [
                { "command": "summary", "description": "This week's progress summary" },
                { "command": "score", "description": "Study score and consistency" },
                { "command": "streak", "description": "Best streak of completed days" },
                { "command": "report", "description": "Report for a date range: /report FROM TO" },
            ]
        });
        if let Err(e) = self.api_post("setMyCommands", commands).await {
            warn!("telegram setMyCommands failed: {e}");
        }
    }
}

//! The interaction state machine.
//!
//! Interprets scheduled triggers and user replies, walks the two-phase daily
//! conversation (evening start-check, night completion-check with a
//! hard-topic follow-up), writes day cells into the plan document, and hands
//! every write to the sync gateway's retry wrapper.
//!
//! The durable interaction record is reloaded at the start of every handler
//! and rewritten on every transition, so a restart mid-conversation resumes
//! where it left off. Nothing from the ledger or the gateway escapes a
//! handler as an error: a bad day's row must never stop the next day's
//! reminders.

use super::scheduler::{Scheduler, Trigger};
use chrono::{FixedOffset, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use streak_core::{
    config::Config,
    error::StreakError,
    message::{Button, IncomingMessage, OutgoingMessage},
    shellexpand, slot,
    traits::{Channel, SyncGateway},
};
use streak_ledger::{
    plan::{PlanDocument, PlanError, DONE_MARK, HARD_TOPIC_COLUMN, MISS_MARK, NO_TOPIC, STATUS_COLUMN},
    InteractionState, StateStore,
};
use streak_sync::sync_with_retry;
use tracing::{debug, error, info, warn};

/// Button payloads.
pub const EVENING_YES: &str = "evening_yes";
pub const EVENING_NO: &str = "evening_no";
pub const NIGHT_YES: &str = "night_yes";
pub const NIGHT_NO: &str = "night_no";

/// One-shot timer names.
pub const EVENING_RETRY_TIMER: &str = "evening_retry";
pub const HARD_TOPIC_TIMEOUT_TIMER: &str = "hard_topic_timeout";

/// Result of a day-cell write attempt.
///
/// Skipped covers everything non-fatal: out-of-range day, missing column,
/// document I/O failure. The caller's own flags are managed independently.
enum WriteOutcome {
    Written { synced: bool },
    Skipped,
}

impl WriteOutcome {
    /// User-facing acknowledgement, with the sync warning appended when the
    /// local write landed but the remote copy did not.
    fn ack(&self, base: &str) -> String {
        match self {
            WriteOutcome::Written { synced: false } => {
                format!("{base}\n(saved locally, remote sync failed)")
            }
            _ => base.to_string(),
        }
    }
}

/// The day-tracking state machine.
pub struct Tracker {
    channel: Arc<dyn Channel>,
    sync: Option<Arc<dyn SyncGateway>>,
    scheduler: Arc<Scheduler>,
    state: StateStore,
    plan_path: PathBuf,
    /// Destination chat for trigger-driven messages.
    reply_target: String,
    start_date: NaiveDate,
    offset: FixedOffset,
    evening_retry_delay: Duration,
    evening_max_prompts: u32,
    hard_topic_timeout: Duration,
    remote_name: String,
    sync_max_attempts: u32,
    sync_retry_delay: Duration,
}

impl Tracker {
    pub fn new(
        channel: Arc<dyn Channel>,
        sync: Option<Arc<dyn SyncGateway>>,
        scheduler: Arc<Scheduler>,
        config: &Config,
        reply_target: String,
    ) -> Result<Self, StreakError> {
        Ok(Self {
            channel,
            sync,
            scheduler,
            state: StateStore::new(shellexpand(&config.state.path)),
            plan_path: PathBuf::from(shellexpand(&config.tracking.plan_path)),
            reply_target,
            start_date: config.tracking.start()?,
            offset: config.tracking.offset()?,
            evening_retry_delay: Duration::from_secs(config.tracking.evening_retry_secs),
            evening_max_prompts: config.tracking.evening_max_prompts,
            hard_topic_timeout: Duration::from_secs(config.tracking.hard_topic_timeout_secs),
            remote_name: config.sync.remote_name.clone(),
            sync_max_attempts: config.sync.max_attempts,
            sync_retry_delay: Duration::from_secs(config.sync.retry_delay_secs),
        })
    }

    /// Today in the user's local timezone.
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    // --- transitions -------------------------------------------------------

    /// Evening trigger (daily or retry timer): prompt up to the bound, then
    /// give up for the day.
    pub async fn on_evening(&self) {
        let mut state = self.load_state();
        if state.evening_retry_count >= self.evening_max_prompts {
            state.evening_retry_count = 0;
            self.store_state(&state);
            info!("evening check: no response after {} prompts, giving up for today", self.evening_max_prompts);
            return;
        }

        state.evening_retry_count += 1;
        self.store_state(&state);

        self.send_buttons(
            "Have you started studying? 📔",
            &[
                Button::new("✅ Yes", EVENING_YES),
                Button::new("❌ No", EVENING_NO),
            ],
        )
        .await;

        // Cancel-then-reschedule keeps exactly one retry timer armed.
        self.scheduler.cancel(EVENING_RETRY_TIMER).await;
        self.scheduler
            .schedule_once(Trigger::EveningRetry, self.evening_retry_delay, EVENING_RETRY_TIMER)
            .await;
    }

    /// Night trigger: single-shot completion check.
    pub async fn on_night(&self) {
        self.send_buttons(
            "Did you complete today's portion?",
            &[
                Button::new("✅ Yes", NIGHT_YES),
                Button::new("❌ No", NIGHT_NO),
            ],
        )
        .await;
    }

    /// A button press arrived.
    pub async fn on_button(&self, msg: &IncomingMessage) {
        let Some(data) = msg.callback_data.as_deref() else {
            return;
        };
        match data {
            EVENING_YES => {
                let mut state = self.load_state();
                state.evening_retry_count = 0;
                self.store_state(&state);
                self.scheduler.cancel(EVENING_RETRY_TIMER).await;
                self.edit_or_send(msg, "👍 Good, start studying 💪").await;
            }
            EVENING_NO => {
                // The already-armed retry timer is the recovery mechanism.
                let minutes = (self.evening_retry_delay.as_secs() / 60).max(1);
                self.edit_or_send(
                    msg,
                    &format!("⏳ Okay, I'll remind you again in {minutes} minutes."),
                )
                .await;
            }
            NIGHT_YES => {
                let outcome = self.write_today(STATUS_COLUMN, DONE_MARK).await;

                let mut state = self.load_state();
                state.awaiting_hard_topic = true;
                self.store_state(&state);

                self.scheduler.cancel(HARD_TOPIC_TIMEOUT_TIMER).await;
                self.scheduler
                    .schedule_once(
                        Trigger::HardTopicTimeout,
                        self.hard_topic_timeout,
                        HARD_TOPIC_TIMEOUT_TIMER,
                    )
                    .await;

                self.edit_or_send(
                    msg,
                    &outcome.ack("🎉 Marked as completed ✅\n\nWhich topic did you find hard today?"),
                )
                .await;
            }
            NIGHT_NO => {
                let outcome = self.write_today(STATUS_COLUMN, MISS_MARK).await;
                self.edit_or_send(
                    msg,
                    &outcome.ack("Marked as not completed ❌\nTry again tomorrow 💪"),
                )
                .await;
            }
            other => {
                debug!("ignoring stray button payload: {other}");
            }
        }
    }

    /// A free-text message arrived. Only meaningful while a hard-topic reply
    /// is awaited; everything else is a stray message for this machine.
    pub async fn on_text(&self, msg: &IncomingMessage) {
        let mut state = self.load_state();
        if !state.awaiting_hard_topic {
            debug!("ignoring stray text message");
            return;
        }

        // Claim the flag before writing: the reply and the timeout race for
        // it, first to clear wins.
        state.awaiting_hard_topic = false;
        self.store_state(&state);

        let outcome = self.write_today(HARD_TOPIC_COLUMN, &msg.text).await;

        let target = msg
            .reply_target
            .clone()
            .unwrap_or_else(|| self.reply_target.clone());
        self.send_text(&target, &outcome.ack("📝 Hard topic saved ✅")).await;
    }

    /// The hard-topic timeout fired. A reply may have beaten it.
    pub async fn on_hard_topic_timeout(&self) {
        let mut state = self.load_state();
        if !state.awaiting_hard_topic {
            debug!("hard-topic timeout fired after the reply, nothing to do");
            return;
        }

        state.awaiting_hard_topic = false;
        self.store_state(&state);

        let outcome = self.write_today(HARD_TOPIC_COLUMN, NO_TOPIC).await;

        self.send_text(
            &self.reply_target,
            &outcome.ack("⏰ No response received. Hard topic recorded as \"None\"."),
        )
        .await;
    }

    // --- ledger ------------------------------------------------------------

    /// Write a cell for today's plan row, then hand the document to the sync
    /// gateway. Every failure degrades to skipping the mutation.
    async fn write_today(&self, column: &str, value: &str) -> WriteOutcome {
        let today = self.today();
        let Some(day_slot) = slot::locate(today, self.start_date) else {
            info!("{today} precedes the tracking start date, skipping {column} write");
            return WriteOutcome::Skipped;
        };

        let mut doc = match PlanDocument::open(&self.plan_path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("failed to open plan document, skipping {column} write: {e}");
                return WriteOutcome::Skipped;
            }
        };

        match doc.write_cell(day_slot.table, day_slot.row, column, value) {
            Ok(()) => {}
            Err(e @ (PlanError::NoTable { .. } | PlanError::NoRow { .. })) => {
                info!("no plan row for {today}, skipping {column} write: {e}");
                return WriteOutcome::Skipped;
            }
            Err(e) => {
                warn!("plan write failed, skipping {column} write: {e}");
                return WriteOutcome::Skipped;
            }
        }

        if let Err(e) = doc.save(&self.plan_path) {
            warn!("failed to save plan document, {column} write lost: {e}");
            return WriteOutcome::Skipped;
        }

        debug!("{today}: wrote {column}");
        let synced = self.sync_plan().await;
        WriteOutcome::Written { synced }
    }

    /// Push the plan document to the remote copy. True when sync is disabled
    /// (nothing to warn about) or the upload eventually succeeded.
    async fn sync_plan(&self) -> bool {
        let Some(ref gateway) = self.sync else {
            return true;
        };
        sync_with_retry(
            gateway.as_ref(),
            &self.plan_path,
            &self.remote_name,
            self.sync_max_attempts,
            self.sync_retry_delay,
        )
        .await
    }

    // --- state -------------------------------------------------------------

    /// Reload the durable interaction state. A read failure degrades to the
    /// empty state rather than wedging the conversation.
    fn load_state(&self) -> InteractionState {
        match self.state.load() {
            Ok(state) => state,
            Err(e) => {
                error!("failed to load interaction state, assuming empty: {e}");
                InteractionState::default()
            }
        }
    }

    fn store_state(&self, state: &InteractionState) {
        if let Err(e) = self.state.store(state) {
            error!("failed to persist interaction state: {e}");
        }
    }

    // --- outbound ----------------------------------------------------------

    async fn send_text(&self, target: &str, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: Some(target.to_string()),
            ..Default::default()
        };
        if let Err(e) = self.channel.send(msg).await {
            error!("failed to send message: {e}");
        }
    }

    async fn send_buttons(&self, text: &str, buttons: &[Button]) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: Some(self.reply_target.clone()),
            buttons: Some(buttons.to_vec()),
            ..Default::default()
        };
        if let Err(e) = self.channel.send(msg).await {
            error!("failed to send prompt: {e}");
        }
    }

    /// Acknowledge a button press by editing the prompt in place (clearing
    /// its keyboard); falls back to a fresh message when there is nothing to
    /// edit.
    async fn edit_or_send(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: incoming
                .reply_target
                .clone()
                .or_else(|| Some(self.reply_target.clone())),
            edit_message_id: incoming.message_id,
            ..Default::default()
        };
        if let Err(e) = self.channel.send(msg).await {
            error!("failed to send acknowledgement: {e}");
        }
    }
}

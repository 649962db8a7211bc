//! Gateway — the serialized event loop connecting the channel, the reminder
//! scheduler, the state machine, and the report side.
//!
//! Scheduled triggers and user-driven events are delivered through one mpsc
//! queue and handled to completion one at a time: a single-writer discipline
//! over the interaction state and the plan document.

pub mod reports;
mod scheduler;
mod tracker;


pub use scheduler::{Scheduler, Trigger};
pub use tracker::Tracker;

use chrono::{FixedOffset, Utc, Weekday};
use std::path::PathBuf;
use std::sync::Arc;
use streak_core::{
    config::Config,
    error::StreakError,
    message::{IncomingMessage, OutgoingMessage},
    shellexpand,
    traits::{Channel, SyncGateway},
};
use streak_ledger::plan::PlanDocument;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Everything the event loop reacts to.
#[derive(Debug)]
pub enum Event {
    /// A text message or button press from the channel.
    Message(IncomingMessage),
    /// A scheduled trigger.
    Trigger(Trigger),
}

/// The central gateway owning the event queue.
pub struct Gateway {
    channel: Arc<dyn Channel>,
    scheduler: Arc<Scheduler>,
    tracker: Tracker,
    config: Config,
    offset: FixedOffset,
    plan_path: PathBuf,
    reply_target: String,
    tx: mpsc::Sender<Event>,
    events: mpsc::Receiver<Event>,
}

impl Gateway {
    /// Create a new gateway. `sync` is None when remote sync is disabled.
    pub fn new(
        channel: Arc<dyn Channel>,
        sync: Option<Arc<dyn SyncGateway>>,
        config: Config,
    ) -> Result<Self, StreakError> {
        let (tx, events) = mpsc::channel::<Event>(256);
        let offset = config.tracking.offset()?;
        let scheduler = Arc::new(Scheduler::new(tx.clone(), offset));

        let reply_target = config
            .channel
            .telegram
            .as_ref()
            .map(|tg| tg.chat_id.to_string())
            .ok_or_else(|| StreakError::Config("no channel configured".into()))?;

        let tracker = Tracker::new(
            channel.clone(),
            sync,
            scheduler.clone(),
            &config,
            reply_target.clone(),
        )?;

        let plan_path = PathBuf::from(shellexpand(&config.tracking.plan_path));

        Ok(Self {
            channel,
            scheduler,
            tracker,
            config,
            offset,
            plan_path,
            reply_target,
            tx,
            events,
        })
    }

    /// Run the event loop until ctrl-c.
    pub async fn run(mut self) -> Result<(), StreakError> {
        info!(
            "Streak gateway running | channel: {} | evening {} | night {}",
            self.channel.name(),
            self.config.tracking.evening_time,
            self.config.tracking.night_time,
        );

        // Forward channel events into the queue.
        let mut channel_rx = self.channel.start().await?;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = channel_rx.recv().await {
                if tx.send(Event::Message(msg)).await.is_err() {
                    info!("gateway receiver dropped, stopping channel forwarder");
                    break;
                }
            }
        });

        // The two daily check-ins, every day of the week.
        self.scheduler
            .schedule_daily(Trigger::Evening, self.config.tracking.evening()?, &[]);
        self.scheduler
            .schedule_daily(Trigger::Night, self.config.tracking.night()?, &[]);

        // Sunday-evening report.
        if self.config.report.enabled {
            self.scheduler.schedule_daily(
                Trigger::WeeklyReport,
                self.config.report.weekly()?,
                &[Weekday::Sun],
            );
        }

        // Main loop: one event at a time, run to completion. No event is
        // handled while another is in flight.
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    self.handle_event(event).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.scheduler.shutdown().await;
        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel: {e}");
        }
        info!("Shutdown complete.");
        Ok(())
    }

    async fn handle_event(&self, event: Event) {
        match event {
            Event::Trigger(Trigger::Evening) | Event::Trigger(Trigger::EveningRetry) => {
                self.tracker.on_evening().await;
            }
            Event::Trigger(Trigger::Night) => {
                self.tracker.on_night().await;
            }
            Event::Trigger(Trigger::HardTopicTimeout) => {
                self.tracker.on_hard_topic_timeout().await;
            }
            Event::Trigger(Trigger::WeeklyReport) => {
                self.send_weekly_report().await;
            }
            Event::Message(msg) => {
                if msg.callback_data.is_some() {
                    self.tracker.on_button(&msg).await;
                } else if msg.text.starts_with('/') {
                    self.on_command(&msg).await;
                } else {
                    self.tracker.on_text(&msg).await;
                }
            }
        }
    }

    /// Deliver the scheduled weekly digest.
    async fn send_weekly_report(&self) {
        let Some(entries) = self.load_entries() else {
            return;
        };
        let today = Utc::now().with_timezone(&self.offset).date_naive();
        let digest = reports::weekly_digest(&entries, today);
        self.send_text(&self.reply_target, &digest).await;
    }

    /// Dispatch a slash command; unknown commands are stray input.
    async fn on_command(&self, msg: &IncomingMessage) {
        let Some(entries) = self.load_entries() else {
            return;
        };
        let today = Utc::now().with_timezone(&self.offset).date_naive();
        let Some(reply) = reports::handle_command(&msg.text, &entries, today) else {
            return;
        };
        let target = msg
            .reply_target
            .clone()
            .unwrap_or_else(|| self.reply_target.clone());
        self.send_text(&target, &reply).await;
    }

    fn load_entries(&self) -> Option<Vec<streak_ledger::DayEntry>> {
        match PlanDocument::open(&self.plan_path) {
            Ok(doc) => Some(doc.entries()),
            Err(e) => {
                error!("failed to open plan document for report: {e}");
                None
            }
        }
    }

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
}

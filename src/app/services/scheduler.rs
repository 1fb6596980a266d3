use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app::services::{colors, lifecycle, Ctx};
use crate::core::gateway::{OutgoingEmbed, OutgoingMessage};
use crate::core::types::TimerAction;
use crate::infra::db::types::TicketTimer;

/// In-process delayed-close tasks, keyed by channel id. This is the
/// volatile fallback backing of the close scheduler: exact wake time,
/// lost on restart.
#[derive(Clone, Default)]
pub struct DelayedCloses {
    tasks: Arc<DashMap<i64, JoinHandle<()>>>,
}

impl DelayedCloses {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, channel_id: i64, handle: JoinHandle<()>) {
        if let Some(old) = self.tasks.insert(channel_id, handle) {
            old.abort();
        }
    }

    fn abort(&self, channel_id: i64) -> bool {
        match self.tasks.remove(&channel_id) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn take(&self, channel_id: i64) {
        self.tasks.remove(&channel_id);
    }

    pub fn contains(&self, channel_id: i64) -> bool {
        self.tasks.contains_key(&channel_id)
    }
}

pub fn abort_in_process_close(delayed: &DelayedCloses, channel_id: i64) -> bool {
    delayed.abort(channel_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Stored as a timer row; survives restart, fires on the poll grid.
    Persisted { execute_at: NaiveDateTime },
    /// In-process task; exact wake time, lost on restart.
    InProcess { execute_at: NaiveDateTime },
}

/// Schedule a close for the channel. Persistent scheduling is preferred;
/// only when the store write fails does this fall back to an in-process
/// task. The two backings are never both live for one channel.
pub async fn schedule_close(
    ctx: &Ctx,
    channel_id: i64,
    user_id: i64,
    delay_secs: u64,
) -> Result<ScheduleOutcome> {
    let execute_at = Utc::now().naive_utc() + chrono::Duration::seconds(delay_secs as i64);

    let persisted = persist_close_timer(ctx, channel_id, user_id, execute_at).await;
    match persisted {
        Ok(()) => {
            ctx.delayed.abort(channel_id);
            Ok(ScheduleOutcome::Persisted { execute_at })
        }
        Err(e) => {
            tracing::error!(
                channel_id,
                error = %e,
                "Failed to persist close timer; scheduling in-process (will not survive restart)"
            );
            spawn_in_process_close(ctx, channel_id, delay_secs);
            Ok(ScheduleOutcome::InProcess { execute_at })
        }
    }
}

async fn persist_close_timer(
    ctx: &Ctx,
    channel_id: i64,
    user_id: i64,
    execute_at: NaiveDateTime,
) -> Result<()> {
    // Supersede any previous close timer for this channel.
    ctx.db.cancel_timer(channel_id, TimerAction::Close).await?;
    ctx.db
        .add_timer(channel_id, user_id, TimerAction::Close, execute_at)
        .await?;
    Ok(())
}

fn spawn_in_process_close(ctx: &Ctx, channel_id: i64, delay_secs: u64) {
    let task_ctx = ctx.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        // Deregister before closing so the close flow's own cleanup does
        // not abort this task mid-run.
        task_ctx.delayed.take(channel_id);
        let notice = OutgoingEmbed {
            description: Some("Closing ticket due to inactivity.".to_string()),
            color: Some(colors::RED),
            ..Default::default()
        };
        if let Err(e) = lifecycle::close_ticket_now(&task_ctx, channel_id, Some(notice)).await {
            tracing::error!(channel_id, error = %e, "In-process delayed close failed");
        }
    });
    ctx.delayed.insert(channel_id, handle);
}

/// Cancel a scheduled close regardless of which backing holds it.
/// Returns whether anything was actually removed.
pub async fn cancel_scheduled_close(ctx: &Ctx, channel_id: i64) -> Result<bool> {
    let removed_rows = match ctx.db.cancel_timer(channel_id, TimerAction::Close).await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(channel_id, error = %e, "Failed to cancel persisted close timer");
            0
        }
    };
    let removed_task = ctx.delayed.abort(channel_id);
    Ok(removed_rows > 0 || removed_task)
}

/// One poll pass: fetch due timers, dispatch each, and consume every row
/// afterward whether or not dispatch succeeded. A timer for a channel
/// that no longer exists must still be reaped. Per-timer failures are
/// logged and never abort the batch.
pub async fn run_due_timers(ctx: &Ctx) -> Result<usize> {
    let now = Utc::now().naive_utc();
    let due = ctx.db.due_timers(now).await?;
    let count = due.len();

    for timer in due {
        match TimerAction::try_from(timer.action.as_str()) {
            Ok(action) => {
                if let Err(e) = dispatch_timer(ctx, &timer, action).await {
                    tracing::error!(
                        channel_id = timer.channel_id,
                        action = %action,
                        error = %e,
                        "Timer dispatch failed"
                    );
                }
            }
            Err(_) => {
                tracing::error!(
                    timer_id = timer.id,
                    action = %timer.action,
                    "Skipping timer with unknown action"
                );
            }
        }
        if let Err(e) = ctx.db.consume_timer(timer.id).await {
            tracing::error!(timer_id = timer.id, error = %e, "Failed to delete fired timer");
        }
    }

    Ok(count)
}

async fn dispatch_timer(ctx: &Ctx, timer: &TicketTimer, action: TimerAction) -> Result<()> {
    match action {
        TimerAction::Close => lifecycle::close_ticket_now(ctx, timer.channel_id, None).await,
        TimerAction::Suspend => {
            let notice = OutgoingEmbed {
                title: Some("📨 Ticket Closed".to_string()),
                description: Some(
                    "User did not respond. This suspended ticket has been closed automatically."
                        .to_string(),
                ),
                color: Some(colors::RED),
                ..Default::default()
            };
            lifecycle::close_ticket_now(ctx, timer.channel_id, Some(notice)).await
        }
        TimerAction::Unclaimed => remind_unclaimed(ctx, timer).await,
    }
}

/// Post the "still unclaimed" staff reminder, if the ticket is in fact
/// still open and unclaimed by the time the timer fires.
async fn remind_unclaimed(ctx: &Ctx, timer: &TicketTimer) -> Result<()> {
    let Some(ticket) = ctx.db.get_open_ticket_by_channel(timer.channel_id).await? else {
        return Ok(());
    };
    if ticket.is_claimed() {
        return Ok(());
    }
    if ctx
        .gateway
        .resolve_channel(timer.channel_id)
        .await?
        .is_none()
    {
        return Ok(());
    }

    let embed = OutgoingEmbed {
        description: Some(format!(
            "⏰ This ticket from <@{}> has not been claimed yet.",
            ticket.user_id
        )),
        color: Some(colors::ORANGE),
        ..Default::default()
    };
    ctx.gateway
        .send_message(
            timer.channel_id,
            OutgoingMessage {
                content: Some(format!("<@&{}>", ctx.config.discord.staff_ping_role_id)),
                embed: Some(embed),
                ..Default::default()
            },
        )
        .await?;
    ctx.db.mark_ticket_notified(timer.channel_id).await?;
    if let Some(updated) = ctx.db.get_open_ticket_by_channel(timer.channel_id).await? {
        ctx.cache.insert(updated);
    }
    Ok(())
}

/// Background poll loop, spawned once after the gateway reports ready.
/// A single bad timer row cannot kill it; neither can a failed pass.
pub fn spawn_timer_poll_task(ctx: Ctx, cancel_token: CancellationToken) {
    let interval_secs = ctx.config.operational_parameters.timer_poll_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            tokio::select! {
                () = cancel_token.cancelled() => break,
                _ = interval.tick() => {}
            }
            match run_due_timers(&ctx).await {
                Ok(processed) if processed > 0 => {
                    tracing::info!(processed, "Processed due ticket timers");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Timer poll pass failed");
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "../../../tests/unit/app_scheduler.rs"]
mod tests;

use super::*;
use chrono::Duration;

use crate::app::services::testkit;
use crate::core::gateway::ChannelRef;
use crate::infra::db::tickets::NewTicket;

async fn open_ticket_row(h: &testkit::TestHarness, channel_id: i64, user_id: i64) {
    h.ctx
        .db
        .create_ticket(NewTicket {
            channel_id,
            user_id,
            member_username: "luna",
            category_id: 70,
            channel_name: "dx-luna",
            ticket_type: "questions",
        })
        .await
        .unwrap();
    h.gateway.add_channel(ChannelRef {
        id: channel_id,
        name: "dx-luna".to_string(),
        topic: Some(format!("Ticket for luna ({user_id})")),
        category_id: Some(70),
    });
}

#[tokio::test]
async fn schedule_close_prefers_the_store() {
    let h = testkit::setup().await;
    open_ticket_row(&h, 1, 10).await;

    let outcome = schedule_close(&h.ctx, 1, 10, 3600).await.unwrap();
    assert!(matches!(outcome, ScheduleOutcome::Persisted { .. }));
    assert!(!h.ctx.delayed.contains(1));

    let pending = h.ctx.db.pending_timers(1).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].action, "close");

    // Rescheduling supersedes rather than stacking.
    schedule_close(&h.ctx, 1, 10, 7200).await.unwrap();
    assert_eq!(h.ctx.db.pending_timers(1).await.unwrap().len(), 1);

    assert!(cancel_scheduled_close(&h.ctx, 1).await.unwrap());
    // Cancelling twice is safe and reports nothing found.
    assert!(!cancel_scheduled_close(&h.ctx, 1).await.unwrap());

    h.teardown().await;
}

#[tokio::test]
async fn schedule_close_falls_back_in_process_when_store_is_down() {
    let h = testkit::setup().await;
    // Kill the pool so the timer insert fails.
    h.ctx.db.close().await;

    let outcome = schedule_close(&h.ctx, 5, 10, 3600).await.unwrap();
    assert!(matches!(outcome, ScheduleOutcome::InProcess { .. }));
    assert!(h.ctx.delayed.contains(5));

    // Unified cancellation reaches the in-process backing too.
    assert!(cancel_scheduled_close(&h.ctx, 5).await.unwrap());
    assert!(!h.ctx.delayed.contains(5));

    let _ = std::fs::remove_file(&h.db_path);
    let _ = std::fs::remove_dir_all(&h.scratch_dir);
}

#[tokio::test]
async fn due_close_timer_closes_ticket_and_is_reaped() {
    let h = testkit::setup().await;
    open_ticket_row(&h, 1, 10).await;
    let past = chrono::Utc::now().naive_utc() - Duration::minutes(10);
    h.ctx
        .db
        .add_timer(1, 10, crate::core::types::TimerAction::Close, past)
        .await
        .unwrap();

    assert_eq!(run_due_timers(&h.ctx).await.unwrap(), 1);

    let row = h.ctx.db.get_ticket_by_channel(1).await.unwrap().unwrap();
    assert_eq!(row.status, "closed");
    assert!(h.gateway.deleted_channels.lock().unwrap().contains(&1));
    assert!(h.ctx.db.pending_timers(1).await.unwrap().is_empty());

    // Nothing left on the next pass.
    assert_eq!(run_due_timers(&h.ctx).await.unwrap(), 0);

    h.teardown().await;
}

#[tokio::test]
async fn due_suspend_timer_posts_notice_then_closes() {
    let h = testkit::setup().await;
    open_ticket_row(&h, 1, 10).await;
    let past = chrono::Utc::now().naive_utc() - Duration::minutes(1);
    h.ctx
        .db
        .add_timer(1, 10, crate::core::types::TimerAction::Suspend, past)
        .await
        .unwrap();

    run_due_timers(&h.ctx).await.unwrap();

    let sent = h.gateway.sent_to(1);
    assert!(sent.iter().any(|m| m
        .embed
        .as_ref()
        .and_then(|e| e.description.as_deref())
        .is_some_and(|d| d.contains("did not respond"))));
    let row = h.ctx.db.get_ticket_by_channel(1).await.unwrap().unwrap();
    assert_eq!(row.status, "closed");

    h.teardown().await;
}

#[tokio::test]
async fn unclaimed_timer_reminds_staff_once() {
    let h = testkit::setup().await;
    open_ticket_row(&h, 1, 10).await;
    let past = chrono::Utc::now().naive_utc() - Duration::minutes(1);
    h.ctx
        .db
        .add_timer(1, 10, crate::core::types::TimerAction::Unclaimed, past)
        .await
        .unwrap();

    run_due_timers(&h.ctx).await.unwrap();

    let sent = h.gateway.sent_to(1);
    assert!(sent
        .iter()
        .any(|m| m.content.as_deref().is_some_and(|c| c.contains("<@&900>"))));
    let row = h.ctx.db.get_ticket_by_channel(1).await.unwrap().unwrap();
    assert!(row.notified);
    assert_eq!(row.status, "open");
    assert!(h.ctx.db.pending_timers(1).await.unwrap().is_empty());

    h.teardown().await;
}

#[tokio::test]
async fn unclaimed_timer_is_silent_for_claimed_tickets() {
    let h = testkit::setup().await;
    open_ticket_row(&h, 1, 10).await;
    h.ctx.db.claim_ticket(1, 501, "alice").await.unwrap();
    let past = chrono::Utc::now().naive_utc() - Duration::minutes(1);
    h.ctx
        .db
        .add_timer(1, 10, crate::core::types::TimerAction::Unclaimed, past)
        .await
        .unwrap();

    assert_eq!(run_due_timers(&h.ctx).await.unwrap(), 1);
    assert!(h.gateway.sent_to(1).is_empty());
    assert!(h.ctx.db.pending_timers(1).await.unwrap().is_empty());

    h.teardown().await;
}

#[tokio::test]
async fn future_timers_are_left_alone() {
    let h = testkit::setup().await;
    open_ticket_row(&h, 1, 10).await;
    let future = chrono::Utc::now().naive_utc() + Duration::hours(2);
    h.ctx
        .db
        .add_timer(1, 10, crate::core::types::TimerAction::Close, future)
        .await
        .unwrap();

    assert_eq!(run_due_timers(&h.ctx).await.unwrap(), 0);
    assert_eq!(h.ctx.db.pending_timers(1).await.unwrap().len(), 1);
    let row = h.ctx.db.get_ticket_by_channel(1).await.unwrap().unwrap();
    assert_eq!(row.status, "open");

    h.teardown().await;
}

#[tokio::test]
async fn timer_for_vanished_channel_is_still_reaped() {
    let h = testkit::setup().await;
    // No ticket row, no channel: the poll pass must still consume it.
    let past = chrono::Utc::now().naive_utc() - Duration::minutes(1);
    h.ctx
        .db
        .add_timer(999, 10, crate::core::types::TimerAction::Close, past)
        .await
        .unwrap();

    assert_eq!(run_due_timers(&h.ctx).await.unwrap(), 1);
    assert!(h.ctx.db.pending_timers(999).await.unwrap().is_empty());

    h.teardown().await;
}

#[tokio::test]
async fn malformed_timer_rows_cannot_wedge_the_loop() {
    let h = testkit::setup().await;
    let past = chrono::Utc::now().naive_utc() - Duration::minutes(1);
    sqlx::query(
        "INSERT INTO ticket_timers (channel_id, user_id, action, execute_at, status) \
         VALUES (?, ?, 'frobnicate', ?, 'pending')",
    )
    .bind(1i64)
    .bind(10i64)
    .bind(past)
    .execute(&h.ctx.db.pool)
    .await
    .unwrap();

    assert_eq!(run_due_timers(&h.ctx).await.unwrap(), 1);
    assert!(h.ctx.db.pending_timers(1).await.unwrap().is_empty());

    h.teardown().await;
}

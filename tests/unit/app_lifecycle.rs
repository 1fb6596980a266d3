use super::*;
use crate::app::services::testkit;
use crate::core::gateway::AttachmentRef;

fn dm(user: &crate::core::gateway::UserRef, content: &str) -> IncomingDm {
    IncomingDm {
        user: user.clone(),
        dm_channel_id: 9001,
        content: content.to_string(),
        attachments: Vec::new(),
    }
}

#[test]
fn topic_user_id_extraction() {
    assert_eq!(
        user_id_from_topic("Ticket for luna (123456789012345678)"),
        Some(123456789012345678)
    );
    assert_eq!(
        user_id_from_topic("Contact ticket with mira (98765432109876543)"),
        Some(98765432109876543)
    );
    assert_eq!(user_id_from_topic("no snowflake here"), None);
    // Too short to be a snowflake.
    assert_eq!(user_id_from_topic("order (42)"), None);
}

#[test]
fn channel_names_are_sanitized() {
    assert_eq!(ticket_channel_name("Luna Rose"), "dx-luna-rose");
    assert_eq!(ticket_channel_name("mira"), "dx-mira");
}

#[tokio::test]
async fn dm_without_ticket_sends_category_picker() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");

    let outcome = handle_user_dm(&h.ctx, &dm(&user, "hello")).await.unwrap();
    assert_eq!(outcome, DmOutcome::WelcomeSent);

    let sent = h.gateway.sent_to(9001);
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .components
        .iter()
        .any(|c| matches!(c, crate::core::gateway::UiComponent::CategorySelect { .. })));

    h.teardown().await;
}

#[tokio::test]
async fn open_ticket_creates_row_channel_and_reminder() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");

    let outcome = open_ticket(&h.ctx, &user, "questions").await.unwrap();
    let OpenOutcome::Opened { channel_id } = outcome else {
        panic!("expected Opened, got {outcome:?}");
    };

    let ticket = h
        .ctx
        .db
        .get_open_ticket_by_channel(channel_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.user_id, 10);
    assert_eq!(ticket.ticket_type, "questions");
    assert_eq!(ticket.category_id, 70);

    let timers = h.ctx.db.pending_timers(channel_id).await.unwrap();
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].action, "unclaimed");

    // Channel exists with the owner id in the topic.
    let channel = h
        .gateway
        .channels
        .lock()
        .unwrap()
        .get(&channel_id)
        .cloned()
        .unwrap();
    assert_eq!(channel.name, "dx-luna");
    assert!(channel.topic.as_deref().unwrap_or("").contains("(10)"));

    // Staff header carries the claim button; the owner gets a DM.
    let sent = h.gateway.sent_to(channel_id);
    assert!(sent.iter().any(|m| m
        .components
        .iter()
        .any(|c| matches!(c, crate::core::gateway::UiComponent::ClaimButton))));
    assert_eq!(h.gateway.dms_to(10).len(), 1);

    h.teardown().await;
}

#[tokio::test]
async fn duplicate_open_routes_to_existing_ticket() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");

    let first = open_ticket(&h.ctx, &user, "questions").await.unwrap();
    let OpenOutcome::Opened { channel_id } = first else {
        panic!("expected Opened");
    };

    let second = open_ticket(&h.ctx, &user, "reports").await.unwrap();
    assert_eq!(second, OpenOutcome::AlreadyOpen { channel_id });
    assert_eq!(h.ctx.db.get_open_tickets().await.unwrap().len(), 1);

    h.teardown().await;
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let outcome = open_ticket(&h.ctx, &user, "nonsense").await.unwrap();
    assert_eq!(outcome, OpenOutcome::UnknownCategory);
    assert!(h.ctx.db.get_open_tickets().await.unwrap().is_empty());
    h.teardown().await;
}

#[tokio::test]
async fn reply_cancels_suspend_and_pings_watchers() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    let execute_at = chrono::Utc::now().naive_utc() + chrono::Duration::hours(24);
    h.ctx
        .db
        .add_timer(channel_id, 10, crate::core::types::TimerAction::Suspend, execute_at)
        .await
        .unwrap();
    h.ctx.db.add_watcher(channel_id, 501).await.unwrap();

    let outcome = handle_user_dm(&h.ctx, &dm(&user, "sorry for the delay")).await.unwrap();
    assert_eq!(outcome, DmOutcome::Forwarded { channel_id });

    // Zero pending suspend timers after the reply.
    let suspends: Vec<_> = h
        .ctx
        .db
        .pending_timers(channel_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.action == "suspend")
        .collect();
    assert!(suspends.is_empty());

    let sent = h.gateway.sent_to(channel_id);
    assert!(sent
        .iter()
        .any(|m| m.content.as_deref().is_some_and(|c| c.contains("<@501>"))));
    assert!(sent.iter().any(|m| m
        .embed
        .as_ref()
        .is_some_and(|e| e.description.as_deref() == Some("sorry for the delay"))));

    h.teardown().await;
}

#[tokio::test]
async fn forwarded_attachments_are_split_between_embed_and_listing() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    let mut message = dm(&user, "screenshots attached");
    message.attachments = vec![
        AttachmentRef {
            id: 1,
            filename: "shot.png".to_string(),
            url: "https://cdn.example/shot.png".to_string(),
            content_type: Some("image/png".to_string()),
        },
        AttachmentRef {
            id: 2,
            filename: "log.txt".to_string(),
            url: "https://cdn.example/log.txt".to_string(),
            content_type: Some("text/plain".to_string()),
        },
    ];
    handle_user_dm(&h.ctx, &message).await.unwrap();

    let sent = h.gateway.sent_to(channel_id);
    assert!(sent.iter().any(|m| m
        .embed
        .as_ref()
        .is_some_and(|e| e.image_url.as_deref() == Some("https://cdn.example/shot.png"))));
    assert!(sent.iter().any(|m| m
        .content
        .as_deref()
        .is_some_and(|c| c.contains("https://cdn.example/log.txt"))));

    h.teardown().await;
}

#[tokio::test]
async fn claim_cancels_unclaimed_reminder() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    let moderator = testkit::user(501, "alice");
    let outcome = claim_ticket(&h.ctx, channel_id, &moderator).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Claimed);
    assert!(h.ctx.db.pending_timers(channel_id).await.unwrap().is_empty());

    let other = testkit::user(502, "bob");
    assert_eq!(
        claim_ticket(&h.ctx, channel_id, &other).await.unwrap(),
        ClaimOutcome::AlreadyClaimed
    );
    assert_eq!(
        claim_ticket(&h.ctx, 424242, &other).await.unwrap(),
        ClaimOutcome::NotATicket
    );

    h.teardown().await;
}

#[tokio::test]
async fn close_then_reopen_scenario() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id: c1 } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    close_ticket_now(&h.ctx, c1, None).await.unwrap();

    let row = h.ctx.db.get_ticket_by_channel(c1).await.unwrap().unwrap();
    assert_eq!(row.status, "closed");
    assert!(h.gateway.deleted_channels.lock().unwrap().contains(&c1));
    assert!(h.ctx.db.pending_timers(c1).await.unwrap().is_empty());

    // The next DM starts a fresh ticket.
    let outcome = handle_user_dm(&h.ctx, &dm(&user, "hello again")).await.unwrap();
    assert_eq!(outcome, DmOutcome::WelcomeSent);
    let OpenOutcome::Opened { channel_id: c2 } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };
    assert_ne!(c1, c2);

    let old = h.ctx.db.get_ticket_by_channel(c1).await.unwrap().unwrap();
    assert_eq!(old.status, "closed");
    let fresh = h.ctx.db.get_ticket_by_channel(c2).await.unwrap().unwrap();
    assert_eq!(fresh.status, "open");

    h.teardown().await;
}

#[tokio::test]
async fn dm_after_external_channel_loss_closes_stale_row() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    // Channel vanishes outside the bot's control.
    h.gateway.drop_channel(channel_id);

    let outcome = handle_user_dm(&h.ctx, &dm(&user, "anyone there?")).await.unwrap();
    assert_eq!(outcome, DmOutcome::WelcomeSent);

    let row = h.ctx.db.get_ticket_by_channel(channel_id).await.unwrap().unwrap();
    assert_eq!(row.status, "closed");
    assert!(h.ctx.db.pending_timers(channel_id).await.unwrap().is_empty());

    h.teardown().await;
}

#[tokio::test]
async fn external_channel_delete_event_closes_row() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    handle_channel_deleted(&h.ctx, channel_id, Some("Ticket for luna (123456789012345678)"))
        .await
        .unwrap();

    let row = h.ctx.db.get_ticket_by_channel(channel_id).await.unwrap().unwrap();
    assert_eq!(row.status, "closed");
    assert_eq!(h.ctx.cache.open_channel_for_user(10), None);

    h.teardown().await;
}

#[tokio::test]
async fn close_reports_undeliverable_dm_into_channel() {
    let h = testkit::setup().await;
    let user = testkit::user(10, "luna");
    let OpenOutcome::Opened { channel_id } = open_ticket(&h.ctx, &user, "questions").await.unwrap()
    else {
        panic!("expected Opened");
    };

    h.gateway
        .fail_dms
        .store(true, std::sync::atomic::Ordering::SeqCst);
    close_ticket_now(&h.ctx, channel_id, None).await.unwrap();

    let sent = h.gateway.sent_to(channel_id);
    assert!(sent.iter().any(|m| m
        .embed
        .as_ref()
        .and_then(|e| e.description.as_deref())
        .is_some_and(|d| d.contains("Could not DM"))));

    h.teardown().await;
}

#[tokio::test]
async fn contact_ticket_respects_duplicate_open_rule() {
    let h = testkit::setup().await;
    let staff = testkit::user(501, "alice");
    let target = testkit::user(10, "luna");

    let first = open_contact_ticket(&h.ctx, &staff, &target, "checking in").await.unwrap();
    let OpenOutcome::Opened { channel_id } = first else {
        panic!("expected Opened");
    };
    let ticket = h
        .ctx
        .db
        .get_open_ticket_by_channel(channel_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.ticket_type, "contact");
    assert_eq!(ticket.category_id, 77);
    // Contact tickets start staffed: no unclaimed reminder.
    assert!(h.ctx.db.pending_timers(channel_id).await.unwrap().is_empty());

    let second = open_contact_ticket(&h.ctx, &staff, &target, "again").await.unwrap();
    assert_eq!(second, OpenOutcome::AlreadyOpen { channel_id });

    h.teardown().await;
}

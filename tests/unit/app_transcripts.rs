use super::*;
use chrono::Utc;

use crate::app::services::testkit;
use crate::core::gateway::{AttachmentRef, ChannelMessage, EmbedRef, UserRef};

fn message(id: i64, author: UserRef, content: &str) -> ChannelMessage {
    ChannelMessage {
        id,
        author,
        content: content.to_string(),
        timestamp: Utc::now().naive_utc(),
        attachments: Vec::new(),
        embeds: Vec::new(),
    }
}

#[tokio::test]
async fn transcript_renders_lines_and_attachment_markers() {
    let h = testkit::setup().await;
    let owner = testkit::user(10, "luna");
    let staff = testkit::user(501, "alice");

    let mut with_image = message(2, staff.clone(), "see attached");
    with_image.attachments.push(AttachmentRef {
        id: 77,
        filename: "shot.png".to_string(),
        url: "https://cdn.example/shot.png".to_string(),
        content_type: Some("image/png".to_string()),
    });
    let mut with_file = message(3, owner.clone(), "here is the log");
    with_file.attachments.push(AttachmentRef {
        id: 78,
        filename: "log.txt".to_string(),
        url: "https://cdn.example/log.txt".to_string(),
        content_type: Some("text/plain".to_string()),
    });

    h.gateway
        .attachment_bytes
        .lock()
        .unwrap()
        .insert("https://cdn.example/shot.png".to_string(), vec![1, 2, 3]);
    h.gateway.set_history(
        1,
        vec![message(1, owner.clone(), "hello"), with_image, with_file],
    );

    let (path, text) = generate_transcript(&h.ctx, 1).await.unwrap();
    assert!(path.exists());
    assert!(text.contains("luna: hello"));
    assert!(text.contains("[Image saved: "));
    assert!(text.contains("[Attachment: https://cdn.example/log.txt]"));

    // The image landed on disk under the channel/attachment key.
    let image_files: Vec<_> = std::fs::read_dir(&h.ctx.config.transcripts.image_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(image_files.iter().any(|f| f == "1_77_shot.png"));

    h.teardown().await;
}

#[tokio::test]
async fn failed_image_download_degrades_to_url_marker() {
    let h = testkit::setup().await;
    let owner = testkit::user(10, "luna");

    let mut with_image = message(1, owner, "broken image");
    with_image.attachments.push(AttachmentRef {
        id: 79,
        filename: "gone.png".to_string(),
        url: "https://cdn.example/gone.png".to_string(),
        content_type: Some("image/png".to_string()),
    });
    h.gateway.set_history(1, vec![with_image]);

    // No bytes registered for the URL: the download fails, the
    // transcript survives.
    let (_, text) = generate_transcript(&h.ctx, 1).await.unwrap();
    assert!(text.contains("[Attachment: https://cdn.example/gone.png]"));
    assert!(!text.contains("[Image saved:"));

    h.teardown().await;
}

#[tokio::test]
async fn log_ticket_posts_transcript_to_log_channel() {
    let h = testkit::setup().await;
    h.gateway.set_history(1, vec![message(1, testkit::user(10, "luna"), "hi")]);

    log_ticket(&h.ctx, 1, Some(&testkit::user(501, "alice"))).await.unwrap();

    let sent = h.gateway.sent_to(500);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].file.is_some());
    assert_eq!(sent[0].file.as_ref().unwrap().0, "transcript.txt");
    assert!(sent[0]
        .embed
        .as_ref()
        .unwrap()
        .description
        .as_deref()
        .unwrap()
        .contains("<@501>"));

    h.teardown().await;
}

#[tokio::test]
async fn user_transcript_filters_to_owner_and_staff() {
    let h = testkit::setup().await;
    let owner = testkit::user(10, "luna");
    let staff = testkit::user(501, "alice");
    let bystander = testkit::user(777, "rando");
    let mut bot = testkit::user(1, "dx-bot");
    bot.bot = true;

    h.gateway.set_roles(501, vec![20]);

    let mut staff_msg = message(2, staff, "");
    staff_msg.embeds.push(EmbedRef {
        title: Some("Premade Reply".to_string()),
        description: Some("Please read the rules.".to_string()),
        fields: vec![("Note".to_string(), "Pinned".to_string())],
        ..Default::default()
    });

    let history = vec![
        message(1, owner.clone(), "I need help"),
        staff_msg,
        message(3, bystander, "drive-by comment"),
        message(4, bot, "automated notice"),
    ];

    let count = save_user_transcript(&h.ctx, 10, "dx-luna", Some(70), &history)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let entries = load_user_transcripts(&h.ctx.config, 10).unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.channel, "dx-luna");
    assert_eq!(entry.category_id, Some(70));
    assert_eq!(entry.messages.len(), 2);
    assert_eq!(entry.messages[0].role, "USER MESSAGE");
    assert_eq!(entry.messages[1].role, "STAFF RESPONSE");
    // Embed content is flattened into the staff entry.
    assert!(entry.messages[1].content.contains("[Embed Title] Premade Reply"));
    assert!(entry.messages[1].content.contains("Note: Pinned"));

    // A second save appends rather than overwrites.
    save_user_transcript(&h.ctx, 10, "dx-luna", Some(70), &history[..1])
        .await
        .unwrap();
    assert_eq!(load_user_transcripts(&h.ctx.config, 10).unwrap().len(), 2);

    h.teardown().await;
}

#[tokio::test]
async fn empty_filtered_content_becomes_placeholder() {
    let h = testkit::setup().await;
    let owner = testkit::user(10, "luna");
    let history = vec![message(1, owner, "   ")];

    save_user_transcript(&h.ctx, 10, "dx-luna", None, &history).await.unwrap();
    let entries = load_user_transcripts(&h.ctx.config, 10).unwrap();
    assert_eq!(entries[0].messages[0].content, "[no text]");

    h.teardown().await;
}

#[test]
fn transcript_links_point_at_the_file_server() {
    let config: crate::bootstrap::config::Config = toml::from_str(
        r#"
[general]
[database]
db_file = "x.db"
[discord]
token = "t"
guild_id = 1
staff_ping_role_id = 2
log_channel_id = 3
contact_category_id = 4
[tickets]
categories = []
[transcripts]
transcript_dir = "t"
image_dir = "i"
base_url = "http://files.example:5000/"
"#,
    )
    .unwrap();
    assert_eq!(
        transcript_url(&config, 42),
        "http://files.example:5000/index.html?ticket=42"
    );
}

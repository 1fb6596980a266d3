use super::*;

const MINIMAL: &str = r#"
[general]

[database]
db_file = "modmail.db"

[discord]
token = "token"
guild_id = 100
staff_ping_role_id = 200
log_channel_id = 300
contact_category_id = 400

[tickets]
[[tickets.categories]]
key = "questions"
label = "General Questions"
category_id = 500

[transcripts]
transcript_dir = "transcripts"
image_dir = "transcripts/images"
"#;

#[test]
fn minimal_config_applies_defaults() {
    let config: Config = toml::from_str(MINIMAL).unwrap();
    assert_eq!(config.general.log_level, LogLevelConfig::Info);
    assert_eq!(config.tickets.unclaimed_reminder_hours, 48);
    assert_eq!(config.tickets.suspend_close_hours, 24);
    assert_eq!(config.operational_parameters.timer_poll_interval_secs, 300);
    assert_eq!(config.operational_parameters.typing_notice_ttl_secs, 5);
    assert!(config.permissions.junior_role_ids.is_empty());
    assert_eq!(config.transcripts.base_url, "http://127.0.0.1:5000");
}

#[test]
fn ticket_category_ids_include_contact_category() {
    let config: Config = toml::from_str(MINIMAL).unwrap();
    let ids = config.ticket_category_ids();
    assert!(ids.contains(&500));
    assert!(ids.contains(&400));
    assert!(config.is_ticket_category(Some(500)));
    assert!(!config.is_ticket_category(Some(501)));
    assert!(!config.is_ticket_category(None));
}

#[test]
fn category_lookup_by_key() {
    let config: Config = toml::from_str(MINIMAL).unwrap();
    assert_eq!(config.category_by_key("questions").unwrap().category_id, 500);
    assert!(config.category_by_key("nope").is_none());
}

#[test]
fn staff_position_falls_back_to_staff() {
    let config: Config = toml::from_str(MINIMAL).unwrap();
    assert_eq!(config.staff_position_name(&[1, 2, 3]), "Staff");

    let with_positions = format!(
        "{MINIMAL}\n[[permissions.staff_positions]]\nrole_id = 2\nname = \"Moderator\"\n"
    );
    let config: Config = toml::from_str(&with_positions).unwrap();
    assert_eq!(config.staff_position_name(&[1, 2, 3]), "Moderator");
    assert_eq!(config.staff_position_name(&[9]), "Staff");
}

#[test]
fn overridden_intervals_survive_parsing() {
    let overridden = format!(
        "{MINIMAL}\n[operational_parameters]\ntimer_poll_interval_secs = 60\n"
    );
    let config: Config = toml::from_str(&overridden).unwrap();
    assert_eq!(config.operational_parameters.timer_poll_interval_secs, 60);
    assert_eq!(config.operational_parameters.typing_notice_ttl_secs, 5);
}

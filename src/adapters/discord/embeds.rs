use serenity::all::{
    ButtonStyle, Colour, CreateActionRow, CreateAttachment, CreateButton, CreateEmbed,
    CreateEmbedAuthor, CreateEmbedFooter, CreateMessage, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption, Timestamp,
};

use crate::core::callbacks::{CATEGORY_SELECT_ID, CLAIM_BUTTON_ID};
use crate::core::gateway::{CategoryOption, OutgoingEmbed, OutgoingMessage, UiComponent};

pub fn to_create_embed(embed: &OutgoingEmbed) -> CreateEmbed {
    let mut ce = CreateEmbed::new().timestamp(Timestamp::now());
    if let Some(title) = &embed.title {
        ce = ce.title(title.clone());
    }
    if let Some(description) = &embed.description {
        ce = ce.description(description.clone());
    }
    if let Some(color) = embed.color {
        ce = ce.colour(Colour::new(color));
    }
    if let Some(author) = &embed.author_name {
        ce = ce.author(CreateEmbedAuthor::new(author.clone()));
    }
    if let Some(footer) = &embed.footer {
        ce = ce.footer(CreateEmbedFooter::new(footer.clone()));
    }
    if let Some(image) = &embed.image_url {
        ce = ce.image(image.clone());
    }
    for (name, value) in &embed.fields {
        ce = ce.field(name.clone(), value.clone(), false);
    }
    ce
}

pub fn to_create_message(message: OutgoingMessage) -> CreateMessage {
    let mut cm = CreateMessage::new();
    if let Some(content) = message.content {
        cm = cm.content(content);
    }
    if let Some(embed) = &message.embed {
        cm = cm.embed(to_create_embed(embed));
    }
    let rows = to_action_rows(&message.components, false);
    if !rows.is_empty() {
        cm = cm.components(rows);
    }
    if let Some((filename, bytes)) = message.file {
        cm = cm.add_file(CreateAttachment::bytes(bytes, filename));
    }
    cm
}

pub fn to_action_rows(components: &[UiComponent], disabled: bool) -> Vec<CreateActionRow> {
    components
        .iter()
        .map(|component| match component {
            UiComponent::CategorySelect { options } => {
                CreateActionRow::SelectMenu(category_select(options, disabled))
            }
            UiComponent::ClaimButton => CreateActionRow::Buttons(vec![claim_button(disabled)]),
        })
        .collect()
}

pub fn category_select(options: &[CategoryOption], disabled: bool) -> CreateSelectMenu {
    let opts: Vec<CreateSelectMenuOption> = options
        .iter()
        .map(|o| CreateSelectMenuOption::new(o.label.clone(), o.key.clone()))
        .collect();
    CreateSelectMenu::new(
        CATEGORY_SELECT_ID,
        CreateSelectMenuKind::String { options: opts },
    )
    .placeholder("📌 Select a ticket category...")
    .min_values(1)
    .max_values(1)
    .disabled(disabled)
}

pub fn claim_button(disabled: bool) -> CreateButton {
    CreateButton::new(CLAIM_BUTTON_ID)
        .label("Claim Ticket")
        .style(ButtonStyle::Success)
        .disabled(disabled)
}

/// Shorthand for the simple notice embeds most command feedback uses.
pub fn notice_embed(description: impl Into<String>, color: u32) -> OutgoingEmbed {
    OutgoingEmbed {
        description: Some(description.into()),
        color: Some(color),
        ..Default::default()
    }
}

pub fn titled_embed(
    title: impl Into<String>,
    description: impl Into<String>,
    color: u32,
) -> OutgoingEmbed {
    OutgoingEmbed {
        title: Some(title.into()),
        description: Some(description.into()),
        color: Some(color),
        ..Default::default()
    }
}

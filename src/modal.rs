use crate::{
    commands::ephemeral,
    component::ComponentId,
    confirm,
    manager::Manager,
    reminder::Draft,
    sound::Sound,
    voice::playback_failure,
};
use chrono_tz::Tz;
use log::{info, warn};
use serenity::{
    all::{
        ActionRow, ActionRowComponent, ButtonStyle, CreateActionRow, CreateButton,
        CreateInputText, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, CreateModal, InputTextStyle, ModalInteraction,
    },
    prelude::*,
};
use std::sync::Arc;

pub const REMINDER_MODAL: &str = "remind-modal";
pub const TIMEZONE_MODAL: &str = "tz-modal";

const TIME_INPUT: &str = "time";
const MESSAGE_INPUT: &str = "message";
const TZ_INPUT: &str = "tz";
// Leaves room for the "Reminder <id>: " prefix within Discord's 2000 characters
const MESSAGE_MAX_LENGTH: u16 = 1900;

pub fn reminder_modal() -> CreateModal {
    CreateModal::new(REMINDER_MODAL, "Set a Reminder").components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Time (HH:MM)", TIME_INPUT)
                .placeholder("Enter the time")
                .max_length(5),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Message", MESSAGE_INPUT)
                .placeholder("Enter the message")
                .max_length(MESSAGE_MAX_LENGTH),
        ),
    ])
}

pub fn timezone_modal(current: Option<Tz>) -> CreateModal {
    // Left empty to fall back to the default zone
    let input = CreateInputText::new(InputTextStyle::Short, "Timezone (IANA name)", TZ_INPUT)
        .placeholder("Europe/Moscow")
        .required(false);
    let input = match current {
        Some(tz) => input.value(tz.name()),
        None => input,
    };

    CreateModal::new(TIMEZONE_MODAL, "Set your timezone")
        .components(vec![CreateActionRow::InputText(input)])
}

fn input_value<'a>(rows: &'a [ActionRow], custom_id: &str) -> Option<&'a str> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.as_deref()
            }
            _ => None,
        })
}

/// Generic failure notice, as a follow-up once the submission was answered
enum FailureNotice {
    Response(CreateInteractionResponse),
    Followup(CreateInteractionResponseFollowup),
}

const FAILURE_TEXT: &str = "Something went wrong, please try again.";

fn failure_notice(answered: bool) -> FailureNotice {
    if answered {
        FailureNotice::Followup(
            CreateInteractionResponseFollowup::new()
                .content(FAILURE_TEXT)
                .ephemeral(true),
        )
    } else {
        FailureNotice::Response(ephemeral(FAILURE_TEXT))
    }
}

pub async fn handle(
    ctx: Arc<Context>,
    manager: &Manager,
    modal: &ModalInteraction,
) -> Result<(), serenity::Error> {
    let mut answered = false;
    let result = match modal.data.custom_id.as_str() {
        REMINDER_MODAL => handle_reminder(Arc::clone(&ctx), manager, modal, &mut answered).await,
        TIMEZONE_MODAL => handle_timezone(&ctx, manager, modal, &mut answered).await,
        other => {
            warn!("Unknown modal {}", other);
            return Ok(());
        }
    };

    if let Err(why) = result {
        warn!("Error while processing form: {}", why);
        match failure_notice(answered) {
            FailureNotice::Response(response) => {
                modal.create_response(&ctx.http, response).await?;
            }
            FailureNotice::Followup(followup) => {
                modal.create_followup(&ctx.http, followup).await?;
            }
        }
    }

    Ok(())
}

async fn handle_reminder(
    ctx: Arc<Context>,
    manager: &Manager,
    modal: &ModalInteraction,
    answered: &mut bool,
) -> Result<(), serenity::Error> {
    let rows = &modal.data.components;
    let time = input_value(rows, TIME_INPUT).unwrap_or_default();
    let msg = input_value(rows, MESSAGE_INPUT).unwrap_or_default();
    let tz = manager.tz_for(modal.user.id).await;

    let Ok(draft) = Draft::new(time, msg, modal.channel_id, modal.user.id, tz) else {
        modal
            .create_response(&ctx.http, ephemeral("Invalid time format! Use HH:MM."))
            .await?;
        *answered = true;
        return Ok(());
    };

    let draft_id = manager.stage_draft(draft).await;
    modal
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(confirm::create(draft_id)),
        )
        .await?;
    *answered = true;

    if let Err(why) = manager.voice().play(&ctx, Sound::Remind).await {
        warn!("Cannot play reminder prompt: {}", why);
        modal
            .create_followup(
                &ctx.http,
                CreateInteractionResponseFollowup::new()
                    .content(playback_failure(&why))
                    .ephemeral(true),
            )
            .await?;
    }

    Ok(())
}

/// Ephemeral reply carrying the button that opens the reminder form
fn continue_to_reminder(content: String) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .components(vec![CreateActionRow::Buttons(vec![CreateButton::new(
                ComponentId::OpenReminderModal.to_string(),
            )
            .style(ButtonStyle::Primary)
            .label("Set reminder")])])
            .ephemeral(true),
    )
}

async fn handle_timezone(
    ctx: &Context,
    manager: &Manager,
    modal: &ModalInteraction,
    answered: &mut bool,
) -> Result<(), serenity::Error> {
    let tz_str = input_value(&modal.data.components, TZ_INPUT)
        .unwrap_or_default()
        .trim();
    let default_tz = manager.config().default_tz;

    // An empty submission forgets the stored zone
    let response = if tz_str.is_empty() {
        match manager.clear_user_tz(modal.user.id).await {
            Ok(removed) => {
                if removed.is_some() {
                    info!("User {} cleared their timezone", modal.user.id);
                }
                continue_to_reminder(format!(
                    "No timezone stored, reminders use {}.",
                    default_tz
                ))
            }
            Err(why) => ephemeral(why.to_string()),
        }
    } else {
        match manager.set_user_tz(modal.user.id, tz_str).await {
            Ok(tz) => {
                info!("User {} set timezone {}", modal.user.id, tz);
                continue_to_reminder(format!("Timezone set to {}.", tz))
            }
            Err(why) => ephemeral(format!(
                "{} (list of timezone names: <https://w.wiki/4Jx>, capitalization matters!)",
                why
            )),
        }
    };

    modal.create_response(&ctx.http, response).await?;
    *answered = true;

    Ok(())
}

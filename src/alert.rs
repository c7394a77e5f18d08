//! The message posted when a reminder fires, with its acknowledge button

use crate::{
    commands::followup,
    component::ComponentId,
    manager::Manager,
    sound::Sound,
    voice::playback_failure,
};
use log::warn;
use serenity::{
    all::{ButtonStyle, ComponentInteraction, CreateActionRow, CreateButton, CreateMessage},
    prelude::*,
};
use std::sync::Arc;

pub fn create(id: u64, msg: &str) -> CreateMessage {
    CreateMessage::new()
        .content(format!("Reminder {}: {}", id, msg))
        .components(vec![CreateActionRow::Buttons(vec![CreateButton::new(
            ComponentId::Acknowledge(id).to_string(),
        )
        .style(ButtonStyle::Success)
        .label("Acknowledge")
        .emoji('✅')])])
}

pub async fn handle(
    ctx: Arc<Context>,
    manager: &Manager,
    component: &ComponentInteraction,
    id: u64,
) -> Result<(), serenity::Error> {
    component.defer(&ctx.http).await?;

    if !manager.acknowledge(id).await {
        followup(&ctx, component, "This reminder is no longer active.").await;
        return Ok(());
    }

    let voice = manager.voice();
    voice.stop(&ctx).await;
    if let Err(why) = voice.play(&ctx, Sound::Confirm).await {
        warn!("Cannot play acknowledgement for reminder {}: {}", id, why);
        followup(&ctx, component, &playback_failure(&why)).await;
    }

    component.message.delete(&ctx.http).await
}

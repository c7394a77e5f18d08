//! Confirm/cancel view shown after the reminder form is submitted

use crate::{
    commands::followup,
    component::ComponentId,
    manager::Manager,
    sound::Sound,
    voice::playback_failure,
};
use log::{info, warn};
use serenity::{
    all::{
        ButtonStyle, ComponentInteraction, CreateActionRow, CreateButton,
        CreateInteractionResponseMessage,
    },
    prelude::*,
};
use std::sync::Arc;

pub fn create(draft_id: u64) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .content("Confirm or cancel the reminder:")
        .components(vec![CreateActionRow::Buttons(vec![
            CreateButton::new(ComponentId::ConfirmDraft(draft_id).to_string())
                .style(ButtonStyle::Success)
                .label("Confirm"),
            CreateButton::new(ComponentId::CancelDraft(draft_id).to_string())
                .style(ButtonStyle::Danger)
                .label("Cancel"),
        ])])
}

pub async fn handle(
    ctx: Arc<Context>,
    manager: &Manager,
    component: &ComponentInteraction,
    draft_id: u64,
    confirmed: bool,
) -> Result<(), serenity::Error> {
    component.defer(&ctx.http).await?;

    let Some(draft) = manager.take_draft(draft_id).await else {
        followup(&ctx, component, "This reminder is no longer pending.").await;
        return Ok(());
    };

    let sound = if confirmed {
        info!("Draft {} confirmed by {}", draft_id, component.user.id);
        Sound::Confirm
    } else {
        info!("Draft {} cancelled by {}", draft_id, component.user.id);
        Sound::Cancel
    };

    let voice = manager.voice();
    voice.stop(&ctx).await;
    if let Err(why) = voice.play(&ctx, sound).await {
        warn!("Cannot play {}: {}", sound, why);
        followup(&ctx, component, &playback_failure(&why)).await;
    }

    if let Err(why) = component.message.delete(&ctx.http).await {
        warn!("Cannot delete confirmation view: {}", why);
    }

    if confirmed {
        manager.schedule(Arc::clone(&ctx), draft).await;
    }

    Ok(())
}

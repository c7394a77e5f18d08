use crate::{gate, manager::Manager};
use log::warn;
use serenity::{
    all::{
        CommandInteraction, ComponentInteraction, CreateCommand, CreateInteractionResponse,
        CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    },
    async_trait,
    prelude::*,
};
use std::sync::Arc;

mod all;
mod command;
mod remind;
mod tz;

pub use all::All;
pub use command::Command;
pub use remind::Remind;
pub use tz::Timezone;

/// Commands available with the given configuration
pub fn registry(manager: &Manager) -> Vec<Box<dyn Command>> {
    let mut commands: Vec<Box<dyn Command>> = vec![Box::new(Remind), Box::new(All)];
    if manager.has_tz_store() {
        commands.push(Box::new(Timezone));
    }

    commands
}

pub fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

/// Sends an ephemeral follow-up to a deferred button press, logging failures
pub async fn followup(ctx: &Context, component: &ComponentInteraction, content: &str) {
    if let Err(why) = component
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await
    {
        warn!("Cannot send follow-up: {}", why);
    }
}

/// Answers with the reason when the command is not allowed here, returns whether it is
async fn enforce_gate(
    ctx: &Context,
    manager: &Manager,
    command: &CommandInteraction,
) -> Result<bool, serenity::Error> {
    let user_voice = gate::user_voice_channel(ctx, command.guild_id, command.user.id);

    match gate::check(manager.config(), command.channel_id, user_voice) {
        Ok(()) => Ok(true),
        Err(denial) => {
            command
                .create_response(&ctx.http, ephemeral(denial.to_string()))
                .await?;
            Ok(false)
        }
    }
}

use crate::{
    alert,
    commands::{self, ephemeral, Command},
    component::ComponentId,
    config::Config,
    confirm,
    error::Error,
    gate,
    manager::Manager,
    modal,
    reminder_menu::ReminderMenu,
};
use log::{error, info, warn};
use serenity::{
    all::{
        CommandInteraction, ComponentInteraction, CreateInteractionResponse, Interaction, Ready,
        VoiceState,
    },
    async_trait,
    prelude::*,
};
use std::sync::Arc;

pub struct Handler {
    manager: Manager,
    commands: Vec<Box<dyn Command>>,
}

impl Handler {
    pub async fn with_config(config: Config) -> Result<Self, Error> {
        let manager = Manager::with_config(config).await?;
        let commands = commands::registry(&manager);

        Ok(Self { manager, commands })
    }

    async fn handle_command(
        &self,
        ctx: Arc<Context>,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error> {
        match self
            .commands
            .iter()
            .find(|c| c.name() == command.data.name)
        {
            Some(handler) => handler.handle(ctx, &self.manager, command).await,
            None => {
                warn!("Unknown command {}", command.data.name);
                Ok(())
            }
        }
    }

    async fn handle_component(
        &self,
        ctx: Arc<Context>,
        component: &ComponentInteraction,
    ) -> Result<(), serenity::Error> {
        let Ok(id) = component.data.custom_id.parse::<ComponentId>() else {
            warn!("Unknown component {}", component.data.custom_id);
            return Ok(());
        };

        match id {
            ComponentId::ConfirmDraft(draft_id) => {
                confirm::handle(ctx, &self.manager, component, draft_id, true).await
            }
            ComponentId::CancelDraft(draft_id) => {
                confirm::handle(ctx, &self.manager, component, draft_id, false).await
            }
            ComponentId::CancelReminder(_) | ComponentId::ExitMenu => {
                ReminderMenu::handle(ctx, &self.manager, component, id).await
            }
            ComponentId::Acknowledge(reminder_id) => {
                alert::handle(ctx, &self.manager, component, reminder_id).await
            }
            ComponentId::OpenReminderModal => {
                let user_voice =
                    gate::user_voice_channel(&ctx, component.guild_id, component.user.id);
                let response =
                    match gate::check(self.manager.config(), component.channel_id, user_voice) {
                        Ok(()) => CreateInteractionResponse::Modal(modal::reminder_modal()),
                        Err(denial) => ephemeral(denial.to_string()),
                    };

                component.create_response(&ctx.http, response).await
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let ctx = Arc::new(ctx);

        let result = match &interaction {
            Interaction::Command(command) => self.handle_command(ctx, command).await,
            Interaction::Component(component) => self.handle_component(ctx, component).await,
            Interaction::Modal(submission) => {
                modal::handle(ctx, &self.manager, submission).await
            }
            _ => Ok(()),
        };

        if let Err(why) = result {
            error!("Cannot respond to interaction: {}", why);
        }
    }

    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        let bot = ctx.cache.current_user().id;
        let voice = self.manager.voice();

        if voice.is_displaced(bot, new.user_id, new.channel_id) {
            warn!("Bot was disconnected or moved out of the voice channel, reconnecting");
            voice.attempt_reconnect(&ctx).await;
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.name);

        let voice = self.manager.voice();
        if let Err(why) = voice.connect(&ctx).await {
            error!("Cannot connect to voice channel: {}", why);
        }

        match voice.guild_id(&ctx).await {
            Ok(guild_id) => {
                let commands = self.commands.iter().map(|c| c.create()).collect();
                match guild_id.set_commands(&ctx.http, commands).await {
                    Ok(registered) => info!("Registered {} commands", registered.len()),
                    Err(why) => error!("Cannot register commands: {}", why),
                }
            }
            Err(why) => error!("Cannot find the guild to register commands in: {}", why),
        }

        info!("Bot is ready");
    }
}

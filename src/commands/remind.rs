use super::*;
use crate::modal;
use log::info;

pub struct Remind;

#[async_trait]
impl Command for Remind {
    fn name(&self) -> &'static str {
        "remind"
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Set a reminder")
    }

    async fn handle(
        &self,
        ctx: Arc<Context>,
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error> {
        if !enforce_gate(&ctx, manager, command).await? {
            return Ok(());
        }
        info!("Remind command called by {}", command.user.id);

        // The timezone has to be known before the time can mean anything
        let form = if manager.needs_tz(command.user.id).await {
            modal::timezone_modal(None)
        } else {
            modal::reminder_modal()
        };

        command
            .create_response(&ctx.http, CreateInteractionResponse::Modal(form))
            .await
    }
}

use super::*;
use crate::modal;

pub struct Timezone;

#[async_trait]
impl Command for Timezone {
    fn name(&self) -> &'static str {
        "timezone"
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Set your timezone")
    }

    async fn handle(
        &self,
        ctx: Arc<Context>,
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error> {
        if let Err(denial) = gate::check_channel(manager.config(), command.channel_id) {
            return command
                .create_response(&ctx.http, ephemeral(denial.to_string()))
                .await;
        }

        let current = manager.user_tz(command.user.id).await;
        command
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Modal(modal::timezone_modal(current)),
            )
            .await
    }
}

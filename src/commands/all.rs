use super::*;
use crate::reminder_menu::ReminderMenu;
use chrono::Utc;

pub struct All;

#[async_trait]
impl Command for All {
    fn name(&self) -> &'static str {
        "all"
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Show all active reminders")
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

        let menu = ReminderMenu::new(manager, Utc::now()).await;
        let response = if menu.is_empty() {
            ephemeral("No active reminders.")
        } else {
            CreateInteractionResponse::Message(menu.create())
        };

        command.create_response(&ctx.http, response).await
    }
}

use super::*;

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn create(&self) -> CreateCommand;

    async fn handle(
        &self,
        ctx: Arc<Context>,
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error>;
}

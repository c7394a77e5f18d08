use crate::{
    commands::followup,
    component::ComponentId,
    manager::Manager,
    reminder::Reminder,
    sound::Sound,
    voice::playback_failure,
};
use chrono::{DateTime, Utc};
use log::warn;
use serenity::{
    all::{
        ButtonStyle, Colour, ComponentInteraction, CreateActionRow, CreateButton, CreateEmbed,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    prelude::*,
};
use std::sync::Arc;

const BUTTONS_PER_ROW: usize = 5;
const MAX_ROWS: usize = 5;
// One button slot stays reserved for Exit
const MAX_LISTED: usize = BUTTONS_PER_ROW * MAX_ROWS - 1;

pub struct ReminderMenu {
    reminders: Vec<(u64, Reminder)>,
}

impl ReminderMenu {
    pub async fn new(manager: &Manager, now: DateTime<Utc>) -> Self {
        let mut reminders = manager.active(now).await;
        reminders.truncate(MAX_LISTED);

        Self { reminders }
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    fn embed(&self) -> CreateEmbed {
        self.reminders.iter().fold(
            CreateEmbed::new()
                .title("Active reminders")
                .colour(Colour::BLUE),
            |embed, (id, r)| {
                embed.field(
                    format!("ID: {}", id),
                    format!("Time: {}\nMessage: {}", r.time_text, r.msg),
                    false,
                )
            },
        )
    }

    fn components(&self) -> Vec<CreateActionRow> {
        let ids = self.reminders.iter().map(|(id, _)| *id).collect::<Vec<_>>();

        button_rows(&ids)
            .into_iter()
            .map(|row| {
                CreateActionRow::Buttons(
                    row.into_iter()
                        .map(|component| match component {
                            ComponentId::CancelReminder(id) => {
                                CreateButton::new(component.to_string())
                                    .style(ButtonStyle::Danger)
                                    .label(format!("Cancel {}", id))
                            }
                            _ => CreateButton::new(component.to_string())
                                .style(ButtonStyle::Secondary)
                                .label("Exit"),
                        })
                        .collect(),
                )
            })
            .collect()
    }

    pub fn create(&self) -> CreateInteractionResponseMessage {
        CreateInteractionResponseMessage::new()
            .embed(self.embed())
            .components(self.components())
    }

    fn edit(&self) -> EditInteractionResponse {
        EditInteractionResponse::new()
            .embed(self.embed())
            .components(self.components())
    }

    pub async fn handle(
        ctx: Arc<Context>,
        manager: &Manager,
        component: &ComponentInteraction,
        id: ComponentId,
    ) -> Result<(), serenity::Error> {
        component.defer(&ctx.http).await?;

        let ComponentId::CancelReminder(id) = id else {
            return component.message.delete(&ctx.http).await;
        };

        if manager.cancel(id).await.is_none() {
            followup(&ctx, component, "This reminder is no longer active.").await;
            return Ok(());
        }

        let voice = manager.voice();
        voice.stop(&ctx).await;
        if let Err(why) = voice.play(&ctx, Sound::Cancel).await {
            warn!("Cannot play cancellation of reminder {}: {}", id, why);
            followup(&ctx, component, &playback_failure(&why)).await;
        }

        let menu = Self::new(manager, Utc::now()).await;
        component.edit_response(&ctx.http, menu.edit()).await?;

        Ok(())
    }
}

/// Cancel buttons in reminder order, five to a row, closed by Exit
fn button_rows(ids: &[u64]) -> Vec<Vec<ComponentId>> {
    ids.iter()
        .take(MAX_LISTED)
        .map(|id| ComponentId::CancelReminder(*id))
        .chain(std::iter::once(ComponentId::ExitMenu))
        .collect::<Vec<_>>()
        .chunks(BUTTONS_PER_ROW)
        .map(<[_]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_menu_only_exits() {
        assert_eq!(button_rows(&[]), vec![vec![ComponentId::ExitMenu]]);
    }

    #[test]
    fn buttons_wrap_every_five() {
        let ids = (1..=7).collect::<Vec<_>>();
        let rows = button_rows(&ids);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 5);
        assert_eq!(rows[0][0], ComponentId::CancelReminder(1));
        assert_eq!(
            rows[1],
            vec![
                ComponentId::CancelReminder(6),
                ComponentId::CancelReminder(7),
                ComponentId::ExitMenu,
            ]
        );
    }

    #[test]
    fn listing_is_capped_to_fit_exit() {
        let ids = (1..=30).collect::<Vec<_>>();
        let rows = button_rows(&ids);

        assert_eq!(rows.len(), MAX_ROWS);
        assert!(rows.iter().all(|row| row.len() == BUTTONS_PER_ROW));
        assert_eq!(rows[4][3], ComponentId::CancelReminder(24));
        assert_eq!(rows[4][4], ComponentId::ExitMenu);
    }
}

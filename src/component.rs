use std::{fmt, str::FromStr};

/// Custom IDs carried by the bot's buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    ConfirmDraft(u64),
    CancelDraft(u64),
    CancelReminder(u64),
    ExitMenu,
    Acknowledge(u64),
    OpenReminderModal,
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::ConfirmDraft(id) => write!(f, "draft-confirm-{}", id),
            ComponentId::CancelDraft(id) => write!(f, "draft-cancel-{}", id),
            ComponentId::CancelReminder(id) => write!(f, "reminder-cancel-{}", id),
            ComponentId::ExitMenu => f.write_str("reminder-exit"),
            ComponentId::Acknowledge(id) => write!(f, "reminder-ack-{}", id),
            ComponentId::OpenReminderModal => f.write_str("remind-open"),
        }
    }
}

impl FromStr for ComponentId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reminder-exit" => return Ok(ComponentId::ExitMenu),
            "remind-open" => return Ok(ComponentId::OpenReminderModal),
            _ => (),
        }

        let (prefix, id) = s.rsplit_once('-').ok_or(())?;
        let id = id.parse().map_err(|_| ())?;

        match prefix {
            "draft-confirm" => Ok(ComponentId::ConfirmDraft(id)),
            "draft-cancel" => Ok(ComponentId::CancelDraft(id)),
            "reminder-cancel" => Ok(ComponentId::CancelReminder(id)),
            "reminder-ack" => Ok(ComponentId::Acknowledge(id)),
            _ => Err(()),
        }
    }
}

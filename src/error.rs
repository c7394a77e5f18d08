use serenity::{all::ChannelId, http::HttpError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Discord API error from serenity, boxed due to its size
    #[error(transparent)]
    Discord(#[from] Box<serenity::Error>),

    #[error(transparent)]
    Join(#[from] songbird::error::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("voice channel {0} not found")]
    VoiceChannelNotFound(ChannelId),

    #[error("channel {0} is not a voice channel")]
    NotAVoiceChannel(ChannelId),

    #[error("not connected to the target voice channel")]
    NotConnected,

    #[error("audio file {} not found", .0.display())]
    SoundMissing(PathBuf),

    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),

    #[error("invalid time of day `{0}`, expected HH:MM")]
    InvalidTimeOfDay(String),
}

impl From<serenity::Error> for Error {
    fn from(why: serenity::Error) -> Self {
        Self::Discord(Box::new(why))
    }
}

/// Whether a Discord request failed because the target no longer exists
pub fn is_not_found(why: &serenity::Error) -> bool {
    matches!(
        why,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

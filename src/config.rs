use chrono_tz::Tz;
use serenity::all::ChannelId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("environment variable {0} is not a valid channel ID")]
    InvalidId(&'static str),

    #[error("unknown default timezone `{0}`")]
    InvalidTimezone(String),
}

pub struct Config {
    pub token: String,
    pub voice_channel_id: ChannelId,
    pub text_channel_id: ChannelId,
    pub sounds_dir: PathBuf,
    /// Timezone store location, the store is disabled when unset
    pub tz_file: Option<PathBuf>,
    pub default_tz: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingEnvVar(name));
        let channel = |name: &'static str| {
            required(name)?
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .map(ChannelId::new)
                .ok_or(ConfigError::InvalidId(name))
        };

        let default_tz = match lookup("DEFAULT_TZ") {
            Some(name) => name
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimezone(name))?,
            None => Tz::UTC,
        };

        Ok(Self {
            token: required("DISCORD_TOKEN")?,
            voice_channel_id: channel("VOICE_CHANNEL_ID")?,
            text_channel_id: channel("TEXT_CHANNEL_ID")?,
            sounds_dir: lookup("SOUNDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            tz_file: lookup("TZ_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            default_tz,
        })
    }
}

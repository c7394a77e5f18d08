use crate::config::Config;
use serenity::{
    all::{ChannelId, GuildId, Mentionable, UserId},
    prelude::*,
};
use std::fmt;

/// Why a command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    WrongTextChannel(ChannelId),
    NotInVoice(ChannelId),
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::WrongTextChannel(channel) => write!(
                f,
                "This command can only be used in {}.",
                channel.mention()
            ),
            Denial::NotInVoice(channel) => write!(
                f,
                "This command can only be used while in {}.",
                channel.mention()
            ),
        }
    }
}

/// Only the configured text channel is accepted
pub fn check_channel(config: &Config, channel_id: ChannelId) -> Result<(), Denial> {
    if channel_id == config.text_channel_id {
        Ok(())
    } else {
        Err(Denial::WrongTextChannel(config.text_channel_id))
    }
}

/// The configured text channel, issued by someone sitting in the voice channel
pub fn check(
    config: &Config,
    channel_id: ChannelId,
    user_voice: Option<ChannelId>,
) -> Result<(), Denial> {
    check_channel(config, channel_id)?;

    if user_voice == Some(config.voice_channel_id) {
        Ok(())
    } else {
        Err(Denial::NotInVoice(config.voice_channel_id))
    }
}

/// The voice channel a member currently sits in, according to the cache
pub fn user_voice_channel(
    ctx: &Context,
    guild_id: Option<GuildId>,
    user_id: UserId,
) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id?)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|name| match name {
            "DISCORD_TOKEN" => Some("token".to_string()),
            "VOICE_CHANNEL_ID" => Some("100".to_string()),
            "TEXT_CHANNEL_ID" => Some("200".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn accepts_text_channel_with_member_in_voice() {
        let config = config();
        assert_eq!(
            check(&config, ChannelId::new(200), Some(ChannelId::new(100))),
            Ok(())
        );
    }

    #[test]
    fn text_channel_is_checked_first() {
        let config = config();
        assert_eq!(
            check(&config, ChannelId::new(300), None),
            Err(Denial::WrongTextChannel(ChannelId::new(200)))
        );
    }

    #[test]
    fn member_must_be_in_the_voice_channel() {
        let config = config();
        for voice in [None, Some(ChannelId::new(101))] {
            assert_eq!(
                check(&config, ChannelId::new(200), voice),
                Err(Denial::NotInVoice(ChannelId::new(100)))
            );
        }
    }

    #[test]
    fn denials_mention_the_channel() {
        assert_eq!(
            Denial::WrongTextChannel(ChannelId::new(200)).to_string(),
            "This command can only be used in <#200>."
        );
        assert_eq!(
            Denial::NotInVoice(ChannelId::new(100)).to_string(),
            "This command can only be used while in <#100>."
        );
    }
}

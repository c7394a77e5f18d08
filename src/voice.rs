use crate::{
    error::{is_not_found, Error},
    sound::Sound,
};
use log::{debug, error, info, warn};
use serenity::{
    all::{ChannelId, ChannelType, GuildId, UserId},
    prelude::*,
};
use songbird::{
    input::File,
    tracks::{PlayMode, TrackHandle},
    Call, Songbird,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, OnceLock,
    },
    time::Duration,
};
use tokio::time::{sleep, timeout};

const RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const PLAYBACK_POLL: Duration = Duration::from_millis(250);
// Clips are a few seconds long, anything past this is a stuck track
const PLAYBACK_LIMIT: Duration = Duration::from_secs(30);

/// Presence in the one voice channel the bot lives in
pub struct Voice {
    channel_id: ChannelId,
    guild_id: OnceLock<GuildId>,
    channel_name: OnceLock<String>,
    sounds_dir: PathBuf,
    reconnecting: AtomicBool,
    /// Joins in flight, the bot's own voice state churns meanwhile
    connecting: AtomicUsize,
}

/// Marks a join as in flight until dropped
struct Connecting<'a>(&'a AtomicUsize);

impl<'a> Connecting<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for Connecting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Voice {
    pub fn new(channel_id: ChannelId, sounds_dir: PathBuf) -> Self {
        Self {
            channel_id,
            guild_id: OnceLock::new(),
            channel_name: OnceLock::new(),
            sounds_dir,
            reconnecting: AtomicBool::new(false),
            connecting: AtomicUsize::new(0),
        }
    }

    /// Guild owning the voice channel, looked up once and remembered
    pub async fn guild_id(&self, ctx: &Context) -> Result<GuildId, Error> {
        if let Some(guild_id) = self.guild_id.get() {
            return Ok(*guild_id);
        }

        let channel = self
            .channel_id
            .to_channel(ctx)
            .await
            .map_err(|why| {
                if is_not_found(&why) {
                    Error::VoiceChannelNotFound(self.channel_id)
                } else {
                    why.into()
                }
            })?
            .guild()
            .filter(|channel| channel.kind == ChannelType::Voice)
            .ok_or(Error::NotAVoiceChannel(self.channel_id))?;

        let guild_id = channel.guild_id;
        let _ = self.channel_name.set(channel.name);
        Ok(*self.guild_id.get_or_init(|| guild_id))
    }

    /// Channel name once resolved, its ID before that
    fn channel_label(&self) -> String {
        match self.channel_name.get() {
            Some(name) => format!("#{}", name),
            None => self.channel_id.to_string(),
        }
    }

    async fn songbird(ctx: &Context) -> Result<Arc<Songbird>, Error> {
        songbird::get(ctx).await.ok_or(Error::NotConnected)
    }

    async fn current_call(&self, ctx: &Context) -> Option<Arc<Mutex<Call>>> {
        let guild_id = *self.guild_id.get()?;
        Self::songbird(ctx).await.ok()?.get(guild_id)
    }

    async fn in_channel(&self, call: &Mutex<Call>) -> bool {
        call.lock().await.current_channel() == Some(self.channel_id.into())
    }

    async fn joined_call(&self, ctx: &Context) -> Option<Arc<Mutex<Call>>> {
        let call = self.current_call(ctx).await?;
        let joined = self.in_channel(&call).await;
        joined.then_some(call)
    }

    pub async fn connect(&self, ctx: &Context) -> Result<(), Error> {
        let _connecting = Connecting::start(&self.connecting);
        let guild_id = self.guild_id(ctx).await?;
        let songbird = Self::songbird(ctx).await?;

        // A call left over in another channel is dropped before joining
        if let Some(call) = songbird.get(guild_id) {
            if !self.in_channel(&call).await {
                songbird.remove(guild_id).await?;
            }
        }

        songbird.join(guild_id, self.channel_id).await?;
        info!("Connected to voice channel {}", self.channel_label());

        Ok(())
    }

    /// Whether a voice state update means the bot lost its place
    ///
    /// Updates caused by a join in flight, like leaving a stale call, do not count.
    pub fn is_displaced(&self, bot: UserId, user: UserId, channel: Option<ChannelId>) -> bool {
        user == bot
            && channel != Some(self.channel_id)
            && self.connecting.load(Ordering::Acquire) == 0
    }

    pub async fn attempt_reconnect(&self, ctx: &Context) {
        if self.reconnecting.swap(true, Ordering::AcqRel) {
            debug!("Reconnect already in progress");
            return;
        }

        let mut connected = false;
        for attempt in 1..=RECONNECT_ATTEMPTS {
            match self.connect(ctx).await {
                Ok(()) => {
                    info!("Reconnected after {} attempt(s)", attempt);
                    connected = true;
                    break;
                }
                Err(why) => {
                    warn!("Reconnect attempt {} failed: {}", attempt, why);
                    sleep(RECONNECT_DELAY).await;
                }
            }
        }

        if !connected {
            error!("Giving up on voice channel after {} attempts", RECONNECT_ATTEMPTS);
        }
        self.reconnecting.store(false, Ordering::Release);
    }

    /// Stops whatever clip is playing
    pub async fn stop(&self, ctx: &Context) {
        if let Some(call) = self.current_call(ctx).await {
            call.lock().await.stop();
        }
    }

    /// Plays a clip in the voice channel and waits for it to end
    pub async fn play(&self, ctx: &Context, sound: Sound) -> Result<(), Error> {
        let call = match self.joined_call(ctx).await {
            Some(call) => call,
            None => {
                info!("Not in the voice channel, connecting before playing {}", sound);
                self.connect(ctx).await?;
                self.joined_call(ctx).await.ok_or(Error::NotConnected)?
            }
        };

        let path = sound.path(&self.sounds_dir);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::SoundMissing(path));
        }

        let track = {
            let mut call = call.lock().await;
            call.stop();
            call.play_input(File::new(path).into())
        };

        if timeout(PLAYBACK_LIMIT, wait_for_end(&track)).await.is_err() {
            warn!("{} did not finish in time, stopping it", sound);
            let _ = track.stop();
        }
        debug!("Played {}", sound);

        Ok(())
    }
}

async fn wait_for_end(track: &TrackHandle) {
    // The handle errors out once the driver has dropped the track
    while let Ok(state) = track.get_info().await {
        if !matches!(state.playing, PlayMode::Play | PlayMode::Pause) {
            break;
        }
        sleep(PLAYBACK_POLL).await;
    }
}

/// User-facing explanation of a failed clip
pub fn playback_failure(why: &Error) -> String {
    match why {
        Error::NotConnected | Error::VoiceChannelNotFound(_) | Error::Join(_) => {
            "Failed to connect to the target voice channel.".to_string()
        }
        Error::SoundMissing(path) => format!("Audio file {} not found.", path.display()),
        _ => "An error occurred while playing the sound.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> Voice {
        Voice::new(ChannelId::new(10), PathBuf::from("."))
    }

    #[test]
    fn only_own_departures_trigger_reconnect() {
        let voice = voice();
        let bot = UserId::new(1);

        assert!(voice.is_displaced(bot, bot, None));
        assert!(voice.is_displaced(bot, bot, Some(ChannelId::new(11))));
        assert!(!voice.is_displaced(bot, bot, Some(ChannelId::new(10))));
        assert!(!voice.is_displaced(bot, UserId::new(2), None));
    }

    #[test]
    fn own_leave_during_connect_is_ignored() {
        let voice = voice();
        let bot = UserId::new(1);

        {
            let _outer = Connecting::start(&voice.connecting);
            {
                let _inner = Connecting::start(&voice.connecting);
                assert!(!voice.is_displaced(bot, bot, None));
            }
            assert!(!voice.is_displaced(bot, bot, Some(ChannelId::new(11))));
        }
        assert!(voice.is_displaced(bot, bot, None));
    }

    #[test]
    fn channel_is_named_once_resolved() {
        let voice = voice();
        assert_eq!(voice.channel_label(), "10");

        voice.channel_name.set("Lounge".to_string()).unwrap();
        assert_eq!(voice.channel_label(), "#Lounge");
    }

    #[test]
    fn playback_failures_are_explained() {
        assert_eq!(
            playback_failure(&Error::NotConnected),
            "Failed to connect to the target voice channel."
        );
        assert_eq!(
            playback_failure(&Error::SoundMissing(PathBuf::from("./cancel.mp3"))),
            "Audio file ./cancel.mp3 not found."
        );
        assert_eq!(
            playback_failure(&Error::UnknownTimezone("x".to_string())),
            "An error occurred while playing the sound."
        );
    }
}

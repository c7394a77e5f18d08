use crate::{
    alert,
    config::Config,
    db::Db,
    error::{is_not_found, Error},
    reminder::{Draft, Phase, Reminder},
    sound::Sound,
    voice::Voice,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use serenity::{all::UserId, prelude::*};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};
use tokio::time::sleep;

const RING_INTERVAL: Duration = Duration::from_secs(20);
// Confirmation views left unanswered this long are forgotten
const DRAFT_LIFETIME_SECS: i64 = 60 * 60;

async fn wait_until(datetime: DateTime<Utc>) {
    // A fire instant already in the past converts to an error, there is nothing
    // to wait for then
    if let Ok(remaining) = (datetime - Utc::now()).to_std() {
        sleep(remaining).await;
    }
}

/// Active reminders keyed by an ID that is never reused
#[derive(Default)]
pub struct Registry {
    last_id: u64,
    reminders: BTreeMap<u64, Reminder>,
}

impl Registry {
    pub fn insert(&mut self, reminder: Reminder) -> u64 {
        self.last_id += 1;
        self.reminders.insert(self.last_id, reminder);

        self.last_id
    }

    pub fn contains(&self, id: u64) -> bool {
        self.reminders.contains_key(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Reminder> {
        self.reminders.remove(&id)
    }

    /// Moves a pending reminder to ringing, `false` if it is gone
    pub fn mark_ringing(&mut self, id: u64) -> bool {
        match self.reminders.get_mut(&id) {
            Some(reminder) if reminder.phase == Phase::Pending => {
                reminder.phase = Phase::Ringing;
                true
            }
            _ => false,
        }
    }

    /// Removes a ringing reminder, `false` if it is not ringing
    pub fn acknowledge(&mut self, id: u64) -> bool {
        let ringing = self
            .reminders
            .get(&id)
            .is_some_and(|reminder| reminder.phase == Phase::Ringing);
        if ringing {
            self.reminders.remove(&id);
        }

        ringing
    }

    /// Pending reminders that are not yet due, ordered by ID
    pub fn active(&self, now: DateTime<Utc>) -> Vec<(u64, Reminder)> {
        self.reminders
            .iter()
            .filter(|(_, r)| r.phase == Phase::Pending && r.fire_at >= now)
            .map(|(id, r)| (*id, r.clone()))
            .collect()
    }
}

/// Reminder requests waiting on the confirmation view
#[derive(Default)]
pub struct Drafts {
    last_id: u64,
    drafts: HashMap<u64, (DateTime<Utc>, Draft)>,
}

impl Drafts {
    /// Stores a draft staged at `now`, dropping the ones nobody answered in time
    pub fn stage(&mut self, draft: Draft, now: DateTime<Utc>) -> u64 {
        let before = self.drafts.len();
        self.drafts.retain(|_, (staged_at, _)| {
            now.signed_duration_since(*staged_at).num_seconds() < DRAFT_LIFETIME_SECS
        });
        let expired = before - self.drafts.len();
        if expired > 0 {
            debug!("Dropped {} unanswered draft(s)", expired);
        }

        self.last_id += 1;
        self.drafts.insert(self.last_id, (now, draft));

        self.last_id
    }

    pub fn take(&mut self, id: u64) -> Option<Draft> {
        self.drafts.remove(&id).map(|(_, draft)| draft)
    }
}

pub struct Manager {
    config: Arc<Config>,
    voice: Arc<Voice>,
    registry: Arc<RwLock<Registry>>,
    drafts: RwLock<Drafts>,
    db: Option<RwLock<Db>>,
}

impl Manager {
    pub async fn with_config(config: Config) -> Result<Self, Error> {
        let db = match &config.tz_file {
            Some(path) => {
                info!("Timezone store enabled at {}", path.display());
                Some(RwLock::new(Db::open(path).await?))
            }
            None => None,
        };

        Ok(Self {
            voice: Arc::new(Voice::new(
                config.voice_channel_id,
                config.sounds_dir.clone(),
            )),
            config: Arc::new(config),
            registry: Arc::new(RwLock::new(Registry::default())),
            drafts: RwLock::new(Drafts::default()),
            db,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn has_tz_store(&self) -> bool {
        self.db.is_some()
    }

    /// The user's stored timezone, if the store is enabled and has one
    pub async fn user_tz(&self, user: UserId) -> Option<Tz> {
        match &self.db {
            Some(db) => db.read().await.tz(user),
            None => None,
        }
    }

    /// Whether the one-time timezone setup has to run before a reminder
    pub async fn needs_tz(&self, user: UserId) -> bool {
        self.has_tz_store() && self.user_tz(user).await.is_none()
    }

    pub async fn tz_for(&self, user: UserId) -> Tz {
        self.user_tz(user).await.unwrap_or(self.config.default_tz)
    }

    pub async fn set_user_tz(&self, user: UserId, tz_str: &str) -> Result<Tz, Error> {
        match &self.db {
            Some(db) => db.write().await.set_tz(user, tz_str).await,
            None => tz_str
                .trim()
                .parse()
                .map_err(|_| Error::UnknownTimezone(tz_str.trim().to_string())),
        }
    }

    /// Forgets the user's stored timezone, `None` if there was none
    pub async fn clear_user_tz(&self, user: UserId) -> Result<Option<Tz>, Error> {
        match &self.db {
            Some(db) => db.write().await.remove(user).await,
            None => Ok(None),
        }
    }

    pub async fn stage_draft(&self, draft: Draft) -> u64 {
        self.drafts.write().await.stage(draft, Utc::now())
    }

    pub async fn take_draft(&self, id: u64) -> Option<Draft> {
        self.drafts.write().await.take(id)
    }

    pub async fn active(&self, now: DateTime<Utc>) -> Vec<(u64, Reminder)> {
        self.registry.read().await.active(now)
    }

    pub async fn cancel(&self, id: u64) -> Option<Reminder> {
        let reminder = self.registry.write().await.remove(id);
        if reminder.is_some() {
            info!("Reminder {} cancelled", id);
        }

        reminder
    }

    pub async fn acknowledge(&self, id: u64) -> bool {
        let acknowledged = self.registry.write().await.acknowledge(id);
        if acknowledged {
            info!("Reminder {} acknowledged", id);
        }

        acknowledged
    }

    /// Registers a confirmed draft and starts its timer
    pub async fn schedule(&self, ctx: Arc<Context>, draft: Draft) -> u64 {
        let reminder = Reminder::from_draft(draft, Utc::now());
        let id = self.registry.write().await.insert(reminder.clone());
        info!(
            "Reminder {} by {} scheduled for {} ({})",
            id, reminder.author, reminder.fire_at, reminder.tz
        );

        self.start_reminding(ctx, id, reminder);

        id
    }

    fn start_reminding(&self, ctx: Arc<Context>, id: u64, reminder: Reminder) {
        let registry = Arc::clone(&self.registry);
        let voice = Arc::clone(&self.voice);
        tokio::spawn(async move {
            wait_until(reminder.fire_at).await;

            if !registry.write().await.mark_ringing(id) {
                return;
            }
            info!("Reminder {} is due", id);

            let message = match reminder
                .channel_id
                .send_message(&ctx.http, alert::create(id, &reminder.msg))
                .await
            {
                Ok(message) => message,
                Err(why) => {
                    error!("Cannot post reminder {}: {}", id, why);
                    registry.write().await.remove(id);
                    return;
                }
            };

            while registry.read().await.contains(id) {
                if let Err(why) = voice.play(&ctx, Sound::Notification).await {
                    warn!("Cannot ring reminder {}: {}", id, why);
                }
                sleep(RING_INTERVAL).await;

                match reminder.channel_id.message(&ctx.http, message.id).await {
                    Ok(_) => (),
                    Err(why) if is_not_found(&why) => {
                        info!("Reminder {} message was deleted", id);
                        break;
                    }
                    Err(why) => warn!("Cannot check reminder {} message: {}", id, why),
                }
            }

            registry.write().await.remove(id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveTime};
    use serenity::all::ChannelId;

    fn reminder(fire_at: DateTime<Utc>) -> Reminder {
        Reminder {
            time_text: fire_at.format("%H:%M").to_string(),
            msg: "stretch".to_string(),
            channel_id: ChannelId::new(1),
            author: UserId::new(2),
            tz: Tz::UTC,
            fire_at,
            phase: Phase::Pending,
        }
    }

    #[test]
    fn ids_increment_and_are_not_reused() {
        let now = Utc::now();
        let mut registry = Registry::default();

        assert_eq!(registry.insert(reminder(now)), 1);
        assert_eq!(registry.insert(reminder(now)), 2);
        assert!(registry.remove(2).is_some());
        assert_eq!(registry.insert(reminder(now)), 3);
    }

    #[test]
    fn cancelled_reminder_never_rings() {
        let mut registry = Registry::default();
        let id = registry.insert(reminder(Utc::now()));

        assert!(registry.remove(id).is_some());
        assert!(!registry.mark_ringing(id));
        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn only_ringing_reminders_can_be_acknowledged() {
        let mut registry = Registry::default();
        let id = registry.insert(reminder(Utc::now()));

        assert!(!registry.acknowledge(id));
        assert!(registry.mark_ringing(id));
        assert!(!registry.mark_ringing(id));
        assert!(registry.acknowledge(id));
        assert!(!registry.contains(id));
        assert!(!registry.acknowledge(id));
    }

    #[test]
    fn active_lists_pending_future_reminders_by_id() {
        let now = Utc::now();
        let mut registry = Registry::default();
        let later = registry.insert(reminder(now + ChronoDuration::hours(2)));
        let past = registry.insert(reminder(now - ChronoDuration::minutes(1)));
        let ringing = registry.insert(reminder(now + ChronoDuration::hours(1)));
        let soon = registry.insert(reminder(now + ChronoDuration::minutes(5)));
        registry.mark_ringing(ringing);

        let ids = registry
            .active(now)
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![later, soon]);
        assert!(registry.contains(past));
    }

    fn draft(msg: &str) -> Draft {
        Draft {
            time_text: "10:00".to_string(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            msg: msg.to_string(),
            channel_id: ChannelId::new(1),
            author: UserId::new(2),
            tz: Tz::UTC,
        }
    }

    #[test]
    fn drafts_are_taken_once() {
        let now = Utc::now();
        let mut drafts = Drafts::default();

        let first = drafts.stage(draft("tea"), now);
        let second = drafts.stage(draft("tea"), now);
        assert_ne!(first, second);
        assert_eq!(drafts.take(first).map(|d| d.msg), Some("tea".to_string()));
        assert!(drafts.take(first).is_none());
        assert!(drafts.take(second).is_some());
    }

    #[test]
    fn unanswered_drafts_expire() {
        let start = Utc::now();
        let mut drafts = Drafts::default();

        let stale = drafts.stage(draft("stale"), start);
        let recent = drafts.stage(draft("recent"), start + ChronoDuration::minutes(30));
        let fresh = drafts.stage(draft("fresh"), start + ChronoDuration::minutes(61));

        assert!(drafts.take(stale).is_none());
        assert_eq!(drafts.take(recent).map(|d| d.msg), Some("recent".to_string()));
        assert_eq!(drafts.take(fresh).map(|d| d.msg), Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn timezone_falls_back_to_default_without_store() {
        let config = Config::from_lookup(|name| match name {
            "DISCORD_TOKEN" => Some("token".to_string()),
            "VOICE_CHANNEL_ID" => Some("10".to_string()),
            "TEXT_CHANNEL_ID" => Some("11".to_string()),
            "DEFAULT_TZ" => Some("Asia/Tokyo".to_string()),
            _ => None,
        })
        .unwrap();
        let manager = Manager::with_config(config).await.unwrap();
        let user = UserId::new(5);

        assert!(!manager.has_tz_store());
        assert!(!manager.needs_tz(user).await);
        assert_eq!(manager.tz_for(user).await, chrono_tz::Asia::Tokyo);
        assert!(manager.set_user_tz(user, "Mars/Base").await.is_err());
    }

    #[tokio::test]
    async fn timezone_store_drives_setup() {
        let dir = tempfile::tempdir().unwrap();
        let tz_file = dir.path().join("tz.json").display().to_string();
        let config = Config::from_lookup(|name| match name {
            "DISCORD_TOKEN" => Some("token".to_string()),
            "VOICE_CHANNEL_ID" => Some("10".to_string()),
            "TEXT_CHANNEL_ID" => Some("11".to_string()),
            "TZ_FILE" => Some(tz_file.clone()),
            _ => None,
        })
        .unwrap();
        let manager = Manager::with_config(config).await.unwrap();
        let user = UserId::new(5);

        assert!(manager.needs_tz(user).await);
        assert_eq!(manager.tz_for(user).await, Tz::UTC);
        manager.set_user_tz(user, "Europe/Moscow").await.unwrap();
        assert!(!manager.needs_tz(user).await);
        assert_eq!(manager.tz_for(user).await, chrono_tz::Europe::Moscow);

        assert_eq!(
            manager.clear_user_tz(user).await.unwrap(),
            Some(chrono_tz::Europe::Moscow)
        );
        assert!(manager.needs_tz(user).await);
        assert_eq!(manager.tz_for(user).await, Tz::UTC);
    }
}

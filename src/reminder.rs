use crate::error::Error;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serenity::all::{ChannelId, UserId};

/// A parsed reminder request waiting for the user to confirm or cancel it
#[derive(Debug, Clone)]
pub struct Draft {
    /// The time of day as the user typed it
    pub time_text: String,
    pub time: NaiveTime,
    pub msg: String,
    pub channel_id: ChannelId,
    pub author: UserId,
    pub tz: Tz,
}

impl Draft {
    pub fn new(
        time_text: &str,
        msg: &str,
        channel_id: ChannelId,
        author: UserId,
        tz: Tz,
    ) -> Result<Self, Error> {
        Ok(Self {
            time: parse_time_of_day(time_text)?,
            time_text: time_text.trim().to_string(),
            msg: msg.to_string(),
            channel_id,
            author,
            tz,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the fire instant
    Pending,
    /// Posted and playing the notification until acknowledged
    Ringing,
}

#[derive(Debug, Clone)]
pub struct Reminder {
    pub time_text: String,
    pub msg: String,
    pub channel_id: ChannelId,
    pub author: UserId,
    pub tz: Tz,
    pub fire_at: DateTime<Utc>,
    pub phase: Phase,
}

impl Reminder {
    pub fn from_draft(draft: Draft, now: DateTime<Utc>) -> Self {
        let fire_at = next_occurrence(now, draft.time, draft.tz);

        Self {
            time_text: draft.time_text,
            msg: draft.msg,
            channel_id: draft.channel_id,
            author: draft.author,
            tz: draft.tz,
            fire_at,
            phase: Phase::Pending,
        }
    }
}

pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, Error> {
    let invalid = || Error::InvalidTimeOfDay(input.to_string());
    // Hours take one or two digits, minutes always two
    let field = |s: &str, min_len: usize| {
        (s.len() >= min_len && s.len() <= 2 && s.bytes().all(|b| b.is_ascii_digit()))
            .then(|| s.parse::<u32>().ok())
            .flatten()
    };

    let (hour, minute) = input.trim().split_once(':').ok_or_else(invalid)?;
    let (hour, minute) = field(hour, 1).zip(field(minute, 2)).ok_or_else(invalid)?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Next instant at which the wall clock in `tz` shows `time`, `now` included
///
/// Times skipped by a DST transition move on to the next day that has them,
/// ambiguous times resolve to their earliest instant.
pub fn next_occurrence(now: DateTime<Utc>, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();

    today
        .iter_days()
        .take(3)
        .filter_map(|date| tz.from_local_datetime(&date.and_time(time)).earliest())
        .map(|datetime| datetime.with_timezone(&Utc))
        .find(|datetime| *datetime >= now)
        .unwrap_or_else(|| now + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{Asia::Tokyo, Europe::Berlin};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_valid_times() {
        assert_eq!(parse_time_of_day("07:05").unwrap(), hm(7, 5));
        assert_eq!(parse_time_of_day("7:05").unwrap(), hm(7, 5));
        assert_eq!(parse_time_of_day(" 23:59 ").unwrap(), hm(23, 59));
        assert_eq!(parse_time_of_day("00:00").unwrap(), hm(0, 0));
    }

    #[test]
    fn rejects_invalid_times() {
        for input in [
            "7:5", "07:5", "7:005", "24:00", "12:60", "1200", "12:", ":30", "ab:cd", "12:30:00",
            "-1:30", "123:00", "",
        ] {
            assert!(
                matches!(parse_time_of_day(input), Err(Error::InvalidTimeOfDay(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn later_today_fires_today() {
        let now = utc("2024-05-01T10:00:00Z");
        assert_eq!(next_occurrence(now, hm(12, 0), Tz::UTC), utc("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn earlier_today_fires_tomorrow() {
        let now = utc("2024-05-01T10:00:00Z");
        assert_eq!(next_occurrence(now, hm(9, 0), Tz::UTC), utc("2024-05-02T09:00:00Z"));
    }

    #[test]
    fn current_minute_fires_immediately() {
        let now = utc("2024-05-01T10:00:00Z");
        assert_eq!(next_occurrence(now, hm(10, 0), Tz::UTC), now);
    }

    #[test]
    fn uses_the_wall_clock_of_the_timezone() {
        // 19:00 in Tokyo
        let now = utc("2024-05-01T10:00:00Z");
        assert_eq!(next_occurrence(now, hm(20, 0), Tokyo), utc("2024-05-01T11:00:00Z"));
        assert_eq!(next_occurrence(now, hm(8, 0), Tokyo), utc("2024-05-01T23:00:00Z"));
    }

    #[test]
    fn skipped_time_moves_to_next_day() {
        // 01:00 in Berlin, 02:30 does not exist on this day
        let now = utc("2024-03-31T00:00:00Z");
        assert_eq!(next_occurrence(now, hm(2, 30), Berlin), utc("2024-04-01T00:30:00Z"));
    }

    #[test]
    fn ambiguous_time_uses_earliest_instant() {
        // Midnight in Berlin, 02:30 happens twice on this day
        let now = utc("2024-10-26T22:00:00Z");
        assert_eq!(next_occurrence(now, hm(2, 30), Berlin), utc("2024-10-27T00:30:00Z"));
    }

    #[test]
    fn draft_keeps_typed_time_and_schedules_from_it() {
        let draft = Draft::new(
            " 9:30",
            "stand up",
            ChannelId::new(2),
            UserId::new(3),
            Tz::UTC,
        )
        .unwrap();
        assert_eq!(draft.time_text, "9:30");

        let reminder = Reminder::from_draft(draft, utc("2024-05-01T10:00:00Z"));
        assert_eq!(reminder.fire_at, utc("2024-05-02T09:30:00Z"));
        assert_eq!(reminder.phase, Phase::Pending);
        assert_eq!(reminder.msg, "stand up");
    }
}

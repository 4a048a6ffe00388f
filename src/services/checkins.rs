//! Check-in Aggregator: merges the weekly and daily streams into one
//! recency-ordered feed and owns the last-check-in and trend derivations.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::checkin::{
    CheckinFeedItem, CheckinKind, DailyCheckin, LastCheckin, Trend, WeeklyCheckin,
};
use crate::models::profile::Profile;
use crate::stores::Stores;

pub struct CheckinAggregator;

impl CheckinAggregator {
    /// One feed across both cadences for the given clients, newest first,
    /// capped per stream and overall at `limit`.
    pub async fn recent_feed(
        stores: &Stores,
        client_ids: &[Uuid],
        limit: i64,
    ) -> Result<Vec<CheckinFeedItem>, ApiError> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (weekly, daily, profiles) = tokio::join!(
            stores.bounded(stores.weekly_checkins.list_recent(client_ids, limit)),
            stores.bounded(stores.daily_checkins.list_recent(client_ids, limit)),
            stores.bounded(stores.profiles.list_by_ids(client_ids)),
        );
        let (weekly, daily, profiles) = (weekly?, daily?, profiles?);

        let profiles: HashMap<Uuid, Profile> =
            profiles.into_iter().map(|p| (p.user_id, p)).collect();

        let mut items: Vec<CheckinFeedItem> = weekly
            .into_iter()
            .map(|c| {
                let profile = profiles.get(&c.user_id);
                Self::weekly_item(c, profile)
            })
            .collect();
        items.extend(daily.into_iter().map(|c| {
            let profile = profiles.get(&c.user_id);
            Self::daily_item(c, profile)
        }));

        items.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    /// Later of the client's newest weekly and newest daily check-in. An
    /// exact timestamp tie goes to the daily record.
    pub fn last_checkin(
        weekly: Option<&WeeklyCheckin>,
        daily: Option<&DailyCheckin>,
    ) -> Option<LastCheckin> {
        match (weekly, daily) {
            (None, None) => None,
            (Some(w), None) => Some(Self::weekly_last(w)),
            (None, Some(d)) => Some(Self::daily_last(d)),
            (Some(w), Some(d)) => {
                if w.submitted_at > d.logged_at {
                    Some(Self::weekly_last(w))
                } else {
                    Some(Self::daily_last(d))
                }
            }
        }
    }

    /// Weight direction from the two newest daily logs (newest first).
    /// Fewer than two logs is Neutral.
    pub fn trend(daily_newest_first: &[DailyCheckin]) -> Trend {
        match daily_newest_first {
            [latest, previous, ..] => {
                if latest.weight_kg > previous.weight_kg {
                    Trend::Up
                } else if latest.weight_kg < previous.weight_kg {
                    Trend::Down
                } else {
                    Trend::Neutral
                }
            }
            _ => Trend::Neutral,
        }
    }

    fn weekly_item(c: WeeklyCheckin, profile: Option<&Profile>) -> CheckinFeedItem {
        CheckinFeedItem {
            id: c.id,
            client_id: c.user_id,
            name: profile
                .and_then(Profile::full_name)
                .unwrap_or_else(|| "Onbekend".to_string()),
            initials: profile
                .and_then(Profile::initials)
                .unwrap_or_else(|| "??".to_string()),
            occurred_at: c.submitted_at,
            kind: CheckinKind::Weekly,
            reviewed: c.coach_feedback.is_some(),
            note: c.notes,
        }
    }

    fn daily_item(c: DailyCheckin, profile: Option<&Profile>) -> CheckinFeedItem {
        CheckinFeedItem {
            id: c.id,
            client_id: c.user_id,
            name: profile
                .and_then(Profile::full_name)
                .unwrap_or_else(|| "Onbekend".to_string()),
            initials: profile
                .and_then(Profile::initials)
                .unwrap_or_else(|| "??".to_string()),
            occurred_at: c.logged_at,
            kind: CheckinKind::Daily,
            reviewed: c.coach_feedback.is_some(),
            note: c.mood,
        }
    }

    fn weekly_last(w: &WeeklyCheckin) -> LastCheckin {
        LastCheckin {
            occurred_at: w.submitted_at,
            kind: CheckinKind::Weekly,
            reviewed: w.coach_feedback.is_some(),
        }
    }

    fn daily_last(d: &DailyCheckin) -> LastCheckin {
        LastCheckin {
            occurred_at: d.logged_at,
            kind: CheckinKind::Daily,
            reviewed: d.coach_feedback.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn weekly_at(hours_ago: i64, feedback: Option<&str>) -> WeeklyCheckin {
        WeeklyCheckin {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            submitted_at: Utc::now() - Duration::hours(hours_ago),
            weight_kg: 80.0,
            coach_feedback: feedback.map(String::from),
            notes: None,
        }
    }

    fn daily_at(hours_ago: i64, weight_kg: f64) -> DailyCheckin {
        DailyCheckin {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            logged_at: Utc::now() - Duration::hours(hours_ago),
            weight_kg,
            coach_feedback: None,
            mood: None,
        }
    }

    #[test]
    fn trend_follows_the_two_newest_weights() {
        let up = [daily_at(1, 83.0), daily_at(25, 82.0)];
        assert_eq!(CheckinAggregator::trend(&up), Trend::Up);

        let down = [daily_at(1, 81.0), daily_at(25, 82.0)];
        assert_eq!(CheckinAggregator::trend(&down), Trend::Down);

        let flat = [daily_at(1, 82.0), daily_at(25, 82.0)];
        assert_eq!(CheckinAggregator::trend(&flat), Trend::Neutral);
    }

    #[test]
    fn trend_is_neutral_below_two_entries() {
        assert_eq!(CheckinAggregator::trend(&[]), Trend::Neutral);
        assert_eq!(CheckinAggregator::trend(&[daily_at(1, 82.0)]), Trend::Neutral);
    }

    #[test]
    fn last_checkin_picks_the_later_stream() {
        let weekly = weekly_at(2, Some("Goed bezig"));
        let daily = daily_at(30, 81.5);
        let last = CheckinAggregator::last_checkin(Some(&weekly), Some(&daily)).unwrap();
        assert_eq!(last.kind, CheckinKind::Weekly);
        assert!(last.reviewed);

        let weekly = weekly_at(30, None);
        let daily = daily_at(2, 81.5);
        let last = CheckinAggregator::last_checkin(Some(&weekly), Some(&daily)).unwrap();
        assert_eq!(last.kind, CheckinKind::Daily);
    }

    #[test]
    fn last_checkin_tie_goes_to_daily() {
        let weekly = weekly_at(0, None);
        let mut daily = daily_at(0, 81.5);
        daily.logged_at = weekly.submitted_at;
        let last = CheckinAggregator::last_checkin(Some(&weekly), Some(&daily)).unwrap();
        assert_eq!(last.kind, CheckinKind::Daily);
    }

    #[test]
    fn last_checkin_handles_single_and_absent_streams() {
        let weekly = weekly_at(5, None);
        let last = CheckinAggregator::last_checkin(Some(&weekly), None).unwrap();
        assert_eq!(last.kind, CheckinKind::Weekly);

        let daily = daily_at(5, 80.0);
        let last = CheckinAggregator::last_checkin(None, Some(&daily)).unwrap();
        assert_eq!(last.kind, CheckinKind::Daily);

        assert!(CheckinAggregator::last_checkin(None, None).is_none());
    }
}

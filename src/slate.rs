//! Playable-slate assembly: attach reconciled odds to the week's scheduled
//! events, applying the Thursday exclusion and the last-resort assumed
//! favorite.

use chrono::{Datelike, Weekday};
use futures_util::future::join_all;
use tracing::warn;

use crate::models::{Event, GameOdds, ScheduledEvent};
use crate::odds::{assumed_home_odds, odds_key, EspnOdds, OddsLookup};

/// Thursday games are never played in this pool.
fn is_playable(ev: &ScheduledEvent) -> bool {
    ev.start_local.weekday() != Weekday::Thu
}

/// Pull an event's odds out of a reconciled lookup, probing the reversed key
/// as well: a reversed hit means the entry was stored in the opposite
/// home/away orientation, so its favorite side flips (the spread is the
/// favorite's line either way).
fn lookup_odds(ev: &ScheduledEvent, lookup: &OddsLookup) -> Option<GameOdds> {
    let (home_key, away_key) = odds_key(&ev.home, &ev.away);
    if let Some(odds) = lookup.get(&(home_key.clone(), away_key.clone())) {
        return Some(odds.clone());
    }
    lookup.get(&(away_key, home_key)).map(|odds| GameOdds {
        favorite: odds.favorite.flipped(),
        ..odds.clone()
    })
}

/// Assemble the slate from a pre-built odds lookup. Events the lookup does
/// not cover fall back to the tagged "home team assumed favorite" entry so
/// the pick set stays complete.
pub fn assemble_with_lookup(scheduled: Vec<ScheduledEvent>, lookup: &OddsLookup) -> Vec<Event> {
    scheduled
        .into_iter()
        .filter(is_playable)
        .map(|ev| {
            let odds = match lookup_odds(&ev, lookup) {
                Some(odds) => odds,
                None => {
                    warn!(
                        "Missing odds for {}; defaulting to home team as assumed favorite",
                        ev.short_label()
                    );
                    assumed_home_odds()
                }
            };
            ev.with_odds(odds)
        })
        .collect()
}

/// Assemble the slate by querying the per-event primary source, fetching all
/// events concurrently. Events with no usable quote are dropped with a
/// warning; per-event failures reduce coverage, they never abort the run.
pub async fn assemble_with_espn(scheduled: Vec<ScheduledEvent>, source: &EspnOdds) -> Vec<Event> {
    let playable: Vec<ScheduledEvent> = scheduled.into_iter().filter(is_playable).collect();

    let fetches = playable
        .iter()
        .map(|ev| source.fetch_event_odds(&ev.event_id, &ev.competition_id));
    let results = join_all(fetches).await;

    playable
        .into_iter()
        .zip(results)
        .filter_map(|(ev, result)| match result {
            Ok(Some(odds)) => Some(ev.with_odds(odds)),
            Ok(None) => {
                warn!("Skipping {} due to missing odds", ev.short_label());
                None
            }
            Err(err) => {
                warn!("Skipping {} after odds fetch failure: {}", ev.short_label(), err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, FavoriteSide, Team, EASTERN};
    use chrono::{TimeZone, Utc};

    fn team(location: &str, name: &str, abbr: &str) -> Team {
        Team {
            location: location.to_string(),
            display_name: format!("{} {}", location, name),
            name: name.to_string(),
            short_name: name.to_string(),
            abbreviation: abbr.to_string(),
        }
    }

    fn scheduled_at(day: u32, hour: u32, home: Team, away: Team) -> ScheduledEvent {
        let start = Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0).unwrap();
        ScheduledEvent {
            event_id: format!("{}", day),
            competition_id: format!("{}", day),
            start_utc: start,
            start_local: start.with_timezone(&EASTERN),
            home,
            away,
            status: EventStatus::Scheduled,
        }
    }

    fn odds(spread: f64, favorite: FavoriteSide) -> GameOdds {
        GameOdds {
            spread,
            total: Some(44.0),
            provider: "FanDuel".to_string(),
            favorite,
            assumed: false,
        }
    }

    #[test]
    fn test_assemble_direct_key() {
        // Sunday, Sep 7 2025.
        let ev = scheduled_at(
            7,
            17,
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        );
        let mut lookup = OddsLookup::new();
        lookup.insert(odds_key(&ev.home, &ev.away), odds(-3.0, FavoriteSide::Home));

        let events = assemble_with_lookup(vec![ev], &lookup);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].odds.spread, -3.0);
        assert!(!events[0].odds.assumed);
    }

    #[test]
    fn test_assemble_reversed_key_flips_favorite() {
        let ev = scheduled_at(
            7,
            17,
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        );
        let (home_key, away_key) = odds_key(&ev.home, &ev.away);
        let mut lookup = OddsLookup::new();
        lookup.insert((away_key, home_key), odds(-3.0, FavoriteSide::Home));

        let events = assemble_with_lookup(vec![ev], &lookup);
        assert_eq!(events[0].odds.favorite, FavoriteSide::Away);
        assert_eq!(events[0].odds.spread, -3.0);
    }

    #[test]
    fn test_assemble_missing_odds_assumes_home() {
        let ev = scheduled_at(
            7,
            17,
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        );
        let events = assemble_with_lookup(vec![ev], &OddsLookup::new());
        assert_eq!(events.len(), 1);
        assert!(events[0].odds.assumed);
        assert_eq!(events[0].odds.favorite, FavoriteSide::Home);
    }

    #[test]
    fn test_lookup_through_picks_pipeline() {
        use crate::odds::reconcile;
        use crate::picks::{assign_points, monday_tie_breaker, TieBreaker};

        let chiefs_raiders = scheduled_at(
            7,
            17,
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        );
        // Sep 9 00:15 UTC is Monday evening Eastern.
        let bills_patriots = scheduled_at(
            9,
            0,
            team("New England", "Patriots", "NE"),
            team("Buffalo", "Bills", "BUF"),
        );

        let mut primary = OddsLookup::new();
        primary.insert(
            odds_key(&chiefs_raiders.home, &chiefs_raiders.away),
            GameOdds {
                spread: -7.5,
                total: None,
                provider: "FanDuel".to_string(),
                favorite: FavoriteSide::Home,
                assumed: false,
            },
        );
        let mut fallback = OddsLookup::new();
        fallback.insert(
            odds_key(&bills_patriots.home, &bills_patriots.away),
            GameOdds {
                spread: -2.5,
                total: Some(43.5),
                provider: "bet365".to_string(),
                favorite: FavoriteSide::Away,
                assumed: false,
            },
        );

        let lookup = reconcile(primary, &fallback);
        let events = assemble_with_lookup(vec![chiefs_raiders, bills_patriots], &lookup);
        assert_eq!(events.len(), 2);

        let picks = assign_points(&events, 16, 202501);
        assert_eq!(picks[0].points, 16);
        assert_eq!(picks[0].event.spread_magnitude(), 7.5);
        assert_eq!(picks[1].points, 15);

        match monday_tie_breaker(&picks) {
            TieBreaker::Computed { pick, .. } => assert_eq!(pick, 44),
            other => panic!("expected computed tie-breaker, got {:?}", other),
        }
    }

    #[test]
    fn test_assemble_excludes_thursday() {
        // Sep 5 00:00 UTC is Thursday evening Eastern; Sep 7 is a Sunday.
        let thursday = scheduled_at(
            5,
            0,
            team("Philadelphia", "Eagles", "PHI"),
            team("Dallas", "Cowboys", "DAL"),
        );
        let sunday = scheduled_at(
            7,
            17,
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        );
        let events = assemble_with_lookup(vec![thursday, sunday], &OddsLookup::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].home.abbreviation, "KC");
    }
}

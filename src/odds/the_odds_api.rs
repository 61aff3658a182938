use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{LookupSource, OddsLookup, SlateEntry};
use crate::matching::{find_match, resolve_side, EventMatch, SideMatch, SidedAliases};
use crate::models::{FavoriteSide, GameOdds};

/// Secondary odds source: a bulk The Odds API response covering the week,
/// identified only by plain-text team names.
pub struct TheOddsApi {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
    api_key: String,
    /// Bookmaker keys in preference order; first present block wins.
    bookmakers: Vec<String>,
}

impl TheOddsApi {
    pub fn new(base_url: &str, api_key: &str, bookmakers: Vec<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(TheOddsApi {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            bookmakers,
        })
    }
}

#[async_trait]
impl LookupSource for TheOddsApi {
    fn name(&self) -> &str {
        "The Odds API"
    }

    async fn fetch_lookup(&self, slate: &[SlateEntry]) -> Result<OddsLookup> {
        // Window the request around the slate's kickoff range.
        let kickoffs = slate.iter().map(|e| e.start_utc);
        let (min_start, max_start) = match (kickoffs.clone().min(), kickoffs.max()) {
            (Some(min), Some(max)) => (min - Duration::days(2), max + Duration::days(2)),
            _ => return Ok(OddsLookup::new()),
        };

        let mut query: Vec<(&str, String)> = vec![
            ("apiKey", self.api_key.clone()),
            ("regions", "us".to_string()),
            ("markets", "spreads,totals".to_string()),
            ("oddsFormat", "american".to_string()),
            ("dateFormat", "iso".to_string()),
            ("commenceTimeFrom", fmt_instant(min_start)),
            ("commenceTimeTo", fmt_instant(max_start)),
        ];
        if !self.bookmakers.is_empty() {
            query.push(("bookmakers", self.bookmakers.join(",")));
        }

        debug!("Fetching bulk odds from {}", self.base_url);
        let resp = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .context("The Odds API request failed")?
            .error_for_status()
            .context("The Odds API returned an error status")?;

        let events: Vec<ApiEvent> = resp
            .json()
            .await
            .context("Failed to parse The Odds API response")?;

        Ok(build_lookup(slate, events, &self.bookmakers))
    }
}

fn fmt_instant(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[derive(Debug, Deserialize)]
pub struct ApiEvent {
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiBookmaker {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMarket {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOutcome {
    #[serde(default)]
    pub name: String,
    pub point: Option<f64>,
}

/// Match every slate entry against the response and convert the winning
/// bookmaker block into an odds entry. A response candidate is consumed once
/// matched so two slate entries can never claim the same record.
pub fn build_lookup(
    slate: &[SlateEntry],
    events: Vec<ApiEvent>,
    preference: &[String],
) -> OddsLookup {
    let mut candidates: Vec<(SidedAliases, ApiEvent)> = events
        .into_iter()
        .filter(|e| !e.home_team.is_empty() && !e.away_team.is_empty())
        .map(|e| (SidedAliases::from_labels(&e.home_team, &e.away_team), e))
        .collect();

    let mut lookup = OddsLookup::new();
    for entry in slate {
        let outcome = find_match(&entry.aliases, candidates.iter().map(|(a, _)| a));
        let index = match outcome {
            Some(EventMatch::Full { index, .. }) => index,
            Some(EventMatch::HomeOnly { index }) => {
                warn!(
                    "Degraded odds match for {} (away side unmatched)",
                    entry.label
                );
                index
            }
            None => continue,
        };
        let (_, event) = candidates.remove(index);

        if let Some(odds) = odds_from_event(&event, entry, preference) {
            lookup.insert(entry.key.clone(), odds);
        }
    }
    lookup
}

/// Extract spread/total from the preferred bookmaker block.
///
/// Spread outcomes are named by team, so each is resolved back to a side of
/// the scheduled matchup through the alias machinery; the orientation of the
/// response record therefore never needs inverting. A negative point fixes
/// the favorite outright; a positive point only infers the opposite side when
/// nothing better has been seen. No directional signal at all means the
/// record is unusable.
fn odds_from_event(
    event: &ApiEvent,
    entry: &SlateEntry,
    preference: &[String],
) -> Option<GameOdds> {
    let bookmaker = select_bookmaker(&event.bookmakers, preference)?;

    let spreads = bookmaker.markets.iter().find(|m| m.key == "spreads");
    let totals = bookmaker.markets.iter().find(|m| m.key == "totals");

    let mut favorite: Option<FavoriteSide> = None;
    let mut spread: Option<f64> = None;
    if let Some(market) = spreads {
        for outcome in &market.outcomes {
            let point = match outcome.point {
                Some(p) => p,
                None => continue,
            };
            let side = match resolve_side(&outcome.name, &entry.aliases) {
                SideMatch::Home => FavoriteSide::Home,
                SideMatch::Away => FavoriteSide::Away,
                SideMatch::Ambiguous | SideMatch::Neither => continue,
            };
            if point < 0.0 {
                favorite = Some(side);
                spread = Some(point);
            } else if point > 0.0 && favorite.is_none() {
                favorite = Some(side.flipped());
                spread = Some(-point);
            }
        }
    }
    let (favorite, spread) = match (favorite, spread) {
        (Some(f), Some(s)) => (f, s),
        _ => return None,
    };

    let total = totals.and_then(|market| {
        market
            .outcomes
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case("over"))
            .and_then(|o| o.point)
    });

    let bookmaker_name = if bookmaker.title.is_empty() {
        &bookmaker.key
    } else {
        &bookmaker.title
    };

    Some(GameOdds {
        spread,
        total,
        provider: format!("{} via The Odds API", bookmaker_name),
        favorite,
        assumed: false,
    })
}

fn select_bookmaker<'a>(
    bookmakers: &'a [ApiBookmaker],
    preference: &[String],
) -> Option<&'a ApiBookmaker> {
    for pref in preference {
        if let Some(found) = bookmakers.iter().find(|b| b.key.eq_ignore_ascii_case(pref)) {
            return Some(found);
        }
    }
    bookmakers.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduledEvent, Team, EventStatus, EASTERN};
    use crate::odds::slate_entries;
    use chrono::TimeZone;

    fn team(location: &str, name: &str, abbr: &str) -> Team {
        Team {
            location: location.to_string(),
            display_name: format!("{} {}", location, name),
            name: name.to_string(),
            short_name: name.to_string(),
            abbreviation: abbr.to_string(),
        }
    }

    fn scheduled(home: Team, away: Team) -> ScheduledEvent {
        let start = Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap();
        ScheduledEvent {
            event_id: "1".to_string(),
            competition_id: "1".to_string(),
            start_utc: start,
            start_local: start.with_timezone(&EASTERN),
            home,
            away,
            status: EventStatus::Scheduled,
        }
    }

    fn spread_market(outcomes: Vec<(&str, f64)>) -> ApiMarket {
        ApiMarket {
            key: "spreads".to_string(),
            outcomes: outcomes
                .into_iter()
                .map(|(name, point)| ApiOutcome {
                    name: name.to_string(),
                    point: Some(point),
                })
                .collect(),
        }
    }

    fn totals_market(over: f64) -> ApiMarket {
        ApiMarket {
            key: "totals".to_string(),
            outcomes: vec![
                ApiOutcome {
                    name: "Over".to_string(),
                    point: Some(over),
                },
                ApiOutcome {
                    name: "Under".to_string(),
                    point: Some(over),
                },
            ],
        }
    }

    fn api_event(home: &str, away: &str, bookmakers: Vec<ApiBookmaker>) -> ApiEvent {
        ApiEvent {
            home_team: home.to_string(),
            away_team: away.to_string(),
            bookmakers,
        }
    }

    #[test]
    fn test_build_lookup_home_favorite() {
        let slate = slate_entries(&[scheduled(
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        )]);
        let events = vec![api_event(
            "Kansas City Chiefs",
            "Las Vegas Raiders",
            vec![ApiBookmaker {
                key: "fanduel".to_string(),
                title: "FanDuel".to_string(),
                markets: vec![
                    spread_market(vec![
                        ("Kansas City Chiefs", -7.5),
                        ("Las Vegas Raiders", 7.5),
                    ]),
                    totals_market(43.5),
                ],
            }],
        )];

        let lookup = build_lookup(&slate, events, &["fanduel".to_string()]);
        let odds = &lookup[&slate[0].key];
        assert_eq!(odds.favorite, FavoriteSide::Home);
        assert_eq!(odds.spread, -7.5);
        assert_eq!(odds.total, Some(43.5));
        assert_eq!(odds.provider, "FanDuel via The Odds API");
    }

    #[test]
    fn test_build_lookup_swapped_orientation_keeps_true_sides() {
        // The response lists the matchup with home/away reversed; the
        // favorite must still land on the real home team.
        let slate = slate_entries(&[scheduled(
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        )]);
        let events = vec![api_event(
            "Las Vegas Raiders",
            "Kansas City Chiefs",
            vec![ApiBookmaker {
                key: "fanduel".to_string(),
                title: "FanDuel".to_string(),
                markets: vec![spread_market(vec![
                    ("Kansas City Chiefs", -3.0),
                    ("Las Vegas Raiders", 3.0),
                ])],
            }],
        )];

        let lookup = build_lookup(&slate, events, &[]);
        let odds = &lookup[&slate[0].key];
        assert_eq!(odds.favorite, FavoriteSide::Home);
        assert_eq!(odds.spread, -3.0);
    }

    #[test]
    fn test_build_lookup_positive_only_infers_opposite() {
        let slate = slate_entries(&[scheduled(
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        )]);
        let events = vec![api_event(
            "Kansas City Chiefs",
            "Las Vegas Raiders",
            vec![ApiBookmaker {
                key: "draftkings".to_string(),
                title: "DraftKings".to_string(),
                markets: vec![spread_market(vec![("Las Vegas Raiders", 4.0)])],
            }],
        )];

        let lookup = build_lookup(&slate, events, &[]);
        let odds = &lookup[&slate[0].key];
        assert_eq!(odds.favorite, FavoriteSide::Home);
        assert_eq!(odds.spread, -4.0);
    }

    #[test]
    fn test_build_lookup_no_spread_market_is_skipped() {
        let slate = slate_entries(&[scheduled(
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        )]);
        let events = vec![api_event(
            "Kansas City Chiefs",
            "Las Vegas Raiders",
            vec![ApiBookmaker {
                key: "fanduel".to_string(),
                title: "FanDuel".to_string(),
                markets: vec![totals_market(44.0)],
            }],
        )];

        assert!(build_lookup(&slate, events, &[]).is_empty());
    }

    #[test]
    fn test_build_lookup_candidate_consumed_once() {
        let chiefs_raiders = scheduled(
            team("Kansas City", "Chiefs", "KC"),
            team("Las Vegas", "Raiders", "LV"),
        );
        let slate = slate_entries(&[chiefs_raiders.clone(), chiefs_raiders]);
        let events = vec![api_event(
            "Kansas City Chiefs",
            "Las Vegas Raiders",
            vec![ApiBookmaker {
                key: "fanduel".to_string(),
                title: "FanDuel".to_string(),
                markets: vec![spread_market(vec![("Kansas City Chiefs", -7.5)])],
            }],
        )];

        // Both slate entries share a key, so the single consumed candidate
        // still yields one lookup entry.
        let lookup = build_lookup(&slate, events, &[]);
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn test_select_bookmaker_preference_order() {
        let bookmakers = vec![
            ApiBookmaker {
                key: "betmgm".to_string(),
                ..Default::default()
            },
            ApiBookmaker {
                key: "draftkings".to_string(),
                ..Default::default()
            },
        ];
        let preference = vec!["fanduel".to_string(), "draftkings".to_string()];
        assert_eq!(
            select_bookmaker(&bookmakers, &preference).unwrap().key,
            "draftkings"
        );
        assert_eq!(select_bookmaker(&bookmakers, &[]).unwrap().key, "betmgm");
    }
}

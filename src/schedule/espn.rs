use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use tracing::debug;

use crate::models::{EventStatus, ScheduledEvent, Team, EASTERN};

/// Weekly schedule source backed by the ESPN scoreboard API.
pub struct Scoreboard {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
}

impl Scoreboard {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Scoreboard {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch the full event list for one regular-season week.
    pub async fn fetch_week(&self, season: i32, week: u32) -> Result<Vec<ScheduledEvent>> {
        debug!("Fetching scoreboard from {}", self.base_url);

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("dates", season.to_string()),
                ("seasontype", "2".to_string()),
                ("week", week.to_string()),
            ])
            .send()
            .await
            .context("Scoreboard request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Scoreboard error: {}", resp.status());
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse scoreboard response")?;

        Ok(parse_scoreboard(&raw))
    }
}

/// Parse a scoreboard payload into scheduled events. Events missing a date or
/// either competitor are dropped, not errored.
pub fn parse_scoreboard(raw: &serde_json::Value) -> Vec<ScheduledEvent> {
    let events = match raw["events"].as_array() {
        Some(a) => a,
        None => return vec![],
    };

    events
        .iter()
        .filter_map(|ev| {
            let comp = ev["competitions"].as_array()?.first()?;
            let date_str = comp["date"].as_str().or_else(|| ev["date"].as_str())?;
            let start_utc = parse_kickoff(date_str)?;

            let competitors = comp["competitors"].as_array()?;
            let home = competitors
                .iter()
                .find(|c| c["homeAway"].as_str() == Some("home"))?;
            let away = competitors
                .iter()
                .find(|c| c["homeAway"].as_str() == Some("away"))?;

            Some(ScheduledEvent {
                event_id: ev["id"].as_str()?.to_string(),
                competition_id: comp["id"].as_str()?.to_string(),
                start_utc,
                start_local: start_utc.with_timezone(&EASTERN),
                home: team_from_value(&home["team"])?,
                away: team_from_value(&away["team"])?,
                status: status_from_value(&comp["status"]),
            })
        })
        .collect()
}

fn team_from_value(v: &serde_json::Value) -> Option<Team> {
    let field = |key: &str| v[key].as_str().unwrap_or_default().to_string();
    let team = Team {
        location: field("location"),
        display_name: field("displayName"),
        name: field("name"),
        short_name: field("shortDisplayName"),
        abbreviation: field("abbreviation"),
    };
    // A record with no name fields at all cannot be aliased or matched.
    if team.display_name.is_empty() && team.name.is_empty() && team.location.is_empty() {
        return None;
    }
    Some(team)
}

fn status_from_value(v: &serde_json::Value) -> EventStatus {
    match v["type"]["state"].as_str() {
        Some("in") => EventStatus::InProgress,
        Some("post") => EventStatus::Final,
        _ => EventStatus::Scheduled,
    }
}

/// ESPN kickoff strings come as RFC 3339, sometimes without seconds
/// ("2025-09-07T17:00Z").
fn parse_kickoff(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(date_str) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Season year when none was given. The regular season runs Sep–Jan, so
/// Jan/Feb games belong to the previous calendar year's season.
pub fn infer_season_year(today: NaiveDate) -> i32 {
    if today.month() < 3 {
        today.year() - 1
    } else {
        today.year()
    }
}

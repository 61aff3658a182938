//! League-site integration: fetch the current make-week page, parse the
//! submission already on file out of its radio-button table, and diff it
//! against the computed slate.

use std::collections::HashSet;

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::matching::{canonical, resolve_side, team_aliases, SideMatch, SidedAliases};
use crate::models::Pick;
use crate::picks::TieBreaker;

/// One game row of the site's existing submission.
#[derive(Debug, Clone)]
pub struct ExistingPick {
    pub visitor: String,
    pub home: String,
    pub selected: String,
    pub points: Option<u32>,
}

impl ExistingPick {
    pub fn matchup_label(&self) -> String {
        format!("{} @ {}", self.visitor, self.home)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExistingSubmission {
    pub picks: Vec<ExistingPick>,
    pub tie_breaker: Option<i64>,
}

/// Client for the pick'em league site.
pub struct LeagueSite {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
}

impl LeagueSite {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(LeagueSite {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch and parse the submission currently on file for the week.
    pub async fn fetch_existing(
        &self,
        week: u32,
        login_id: Option<&str>,
        login_key: Option<&str>,
    ) -> Result<ExistingSubmission> {
        let url = format!("{}/make_week", self.base_url);
        let mut query = vec![("week", week.to_string())];
        if let Some(id) = login_id {
            query.push(("i", id.to_string()));
        }
        if let Some(key) = login_key {
            query.push(("k", key.to_string()));
        }

        debug!("Fetching existing submission from {}", url);
        let resp = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("Make-week request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Make-week page error: {}", resp.status());
        }

        let html = resp.text().await.context("Failed to read make-week page")?;
        Ok(parse_submission_html(&html))
    }
}

/// Parse the make-week page: each game is a `<tr>` with two radio inputs
/// (visitor first, then home), team names in `lineitem`-classed cells, a
/// points input named with `pt`/`point`, and a tie-breaker input named with
/// `tie`/`tb`/`mnf`. Rows with no selection are ignored.
pub fn parse_submission_html(html: &str) -> ExistingSubmission {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("tr").unwrap();
    let input_selector = Selector::parse("input").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    // Later rows for the same matchup replace earlier ones, preserving the
    // first-seen ordering.
    let mut picks: Vec<((String, String), ExistingPick)> = Vec::new();

    for row in document.select(&row_selector) {
        let radios: Vec<ElementRef> = row
            .select(&input_selector)
            .filter(|input| input.value().attr("type") == Some("radio"))
            .collect();
        if radios.len() < 2 {
            continue;
        }

        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        let visitor = match team_name_for_radio(&radios[0], &cells) {
            Some(name) => name,
            None => continue,
        };
        let home = match team_name_for_radio(&radios[1], &cells) {
            Some(name) => name,
            None => continue,
        };

        let selected = if radios[0].value().attr("checked").is_some() {
            visitor.clone()
        } else if radios[1].value().attr("checked").is_some() {
            home.clone()
        } else {
            continue;
        };

        let points = row
            .select(&input_selector)
            .find(|input| name_contains(input, &["pt", "point"]))
            .and_then(|input| input.value().attr("value"))
            .and_then(|value| value.trim().parse::<u32>().ok());

        let key = (canonical(&visitor), canonical(&home));
        let pick = ExistingPick {
            visitor,
            home,
            selected,
            points,
        };
        match picks.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = pick,
            None => picks.push((key, pick)),
        }
    }

    let tie_breaker = parse_tie_breaker(&document);

    ExistingSubmission {
        picks: picks.into_iter().map(|(_, p)| p).collect(),
        tie_breaker,
    }
}

/// The team name lives in a sibling cell of the radio's cell. Prefer cells
/// explicitly marked as line items, scanning right then left, then relax the
/// class requirement.
fn team_name_for_radio(radio: &ElementRef, cells: &[ElementRef]) -> Option<String> {
    let radio_cell = radio
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")?;
    let position = cells.iter().position(|c| c.id() == radio_cell.id())?;

    let scan = |indices: Vec<usize>, require_lineitem: bool| -> Option<String> {
        for idx in indices {
            let cell = &cells[idx];
            let text = element_text(cell);
            if text.is_empty() {
                continue;
            }
            if require_lineitem && !cell.value().classes().any(|c| c == "lineitem") {
                continue;
            }
            return Some(text);
        }
        None
    };

    let after: Vec<usize> = (position + 1..cells.len()).collect();
    let before: Vec<usize> = (0..position).rev().collect();

    scan(after.clone(), true)
        .or_else(|| scan(before.clone(), true))
        .or_else(|| scan(after, false))
        .or_else(|| scan(before, false))
}

fn parse_tie_breaker(document: &Html) -> Option<i64> {
    let input_selector = Selector::parse("input").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    // Named input first.
    for input in document.select(&input_selector) {
        if name_contains(&input, &["tie", "tb", "mnf"]) {
            if let Some(value) = input.value().attr("value") {
                if let Ok(parsed) = value.trim().parse::<i64>() {
                    return Some(parsed);
                }
            }
        }
    }

    // Fallback: the cell following one whose text starts with "monday".
    let cells: Vec<ElementRef> = document.select(&cell_selector).collect();
    let monday = cells
        .iter()
        .position(|cell| element_text(cell).to_lowercase().starts_with("monday"))?;
    let digits: String = element_text(cells.get(monday + 1)?)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn name_contains(input: &ElementRef, needles: &[&str]) -> bool {
    input
        .value()
        .attr("name")
        .map(str::to_lowercase)
        .map_or(false, |name| needles.iter().any(|n| name.contains(n)))
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a human-readable diff between the computed picks and what the site
/// already has: different winners, point mismatches, games only one side
/// knows about, and a tie-breaker mismatch. Ambiguous site labels are
/// reported as un-comparable rather than guessed at.
pub fn diff_against_site(
    picks: &[Pick],
    existing: &ExistingSubmission,
    tie_breaker: &TieBreaker,
) -> String {
    if existing.picks.is_empty() {
        let tie_note = existing
            .tie_breaker
            .map(|t| format!(" (tie-breaker total {})", t))
            .unwrap_or_default();
        return format!(
            "Existing comparison: no current picks found on the site{}.",
            tie_note
        );
    }

    // Structured alias sets per computed pick; the site gives us bare labels.
    let entries: Vec<(&Pick, SidedAliases)> = picks
        .iter()
        .map(|pick| {
            let aliases = SidedAliases {
                home: team_aliases(&pick.event.home).into_iter().collect(),
                away: team_aliases(&pick.event.away).into_iter().collect(),
            };
            (pick, aliases)
        })
        .collect();

    let mut diffs: Vec<String> = Vec::new();
    let mut matched: HashSet<usize> = HashSet::new();

    for existing_pick in &existing.picks {
        let visitor_norm = canonical(&existing_pick.visitor);
        let home_norm = canonical(&existing_pick.home);

        let found = entries.iter().enumerate().find(|(_, (_, aliases))| {
            (aliases.away.contains(&visitor_norm) && aliases.home.contains(&home_norm))
                || (aliases.home.contains(&visitor_norm) && aliases.away.contains(&home_norm))
        });

        let (index, (pick, aliases)) = match found {
            Some(hit) => hit,
            None => {
                diffs.push(format!(
                    "- {}: site has {} (pts {}), not found in computed slate.",
                    existing_pick.matchup_label(),
                    existing_pick.selected,
                    points_label(existing_pick.points),
                ));
                continue;
            }
        };
        matched.insert(index);

        let site_side = resolve_side(&existing_pick.selected, aliases);
        match site_side {
            SideMatch::Ambiguous => {
                diffs.push(format!(
                    "- {}: site pick '{}' could match either team; unable to compare.",
                    existing_pick.matchup_label(),
                    existing_pick.selected
                ));
                continue;
            }
            SideMatch::Neither => {
                diffs.push(format!(
                    "- {}: site pick '{}' did not match the home or away team.",
                    existing_pick.matchup_label(),
                    existing_pick.selected
                ));
                continue;
            }
            SideMatch::Home | SideMatch::Away => {}
        }

        let site_selects_home = site_side == SideMatch::Home;
        if site_selects_home != pick.is_selected_home() {
            diffs.push(format!(
                "- {}: site has {} (pts {}), script prefers {} (pts {}).",
                existing_pick.matchup_label(),
                existing_pick.selected,
                points_label(existing_pick.points),
                pick.selected_team().display_name,
                pick.points,
            ));
        } else if existing_pick.points != Some(pick.points) {
            diffs.push(format!(
                "- {}: same winner {}, but site points {} vs script {}.",
                existing_pick.matchup_label(),
                existing_pick.selected,
                points_label(existing_pick.points),
                pick.points,
            ));
        }
    }

    for (index, (pick, _)) in entries.iter().enumerate() {
        if !matched.contains(&index) {
            diffs.push(format!(
                "- {} @ {}: script selects {} (pts {}) but no site pick detected.",
                pick.event.away.display_name,
                pick.event.home.display_name,
                pick.selected_team().display_name,
                pick.points,
            ));
        }
    }

    if let (Some(script_tie), Some(site_tie)) = (tie_breaker.computed_pick(), existing.tie_breaker)
    {
        if script_tie != site_tie {
            diffs.push(format!(
                "- Tie-breaker: site total {}, computed total {}.",
                site_tie, script_tie
            ));
        }
    }

    if diffs.is_empty() {
        return "Existing comparison: site picks already match the computed selections.".to_string();
    }
    format!("Existing comparison:\n{}", diffs.join("\n"))
}

fn points_label(points: Option<u32>) -> String {
    points.map(|p| p.to_string()).unwrap_or_else(|| "--".to_string())
}

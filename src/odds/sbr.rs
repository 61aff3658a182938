use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::{LookupSource, OddsLookup, SlateEntry};
use crate::matching::{find_oriented, resolve_side, SideMatch, SidedAliases};
use crate::models::{FavoriteSide, GameOdds};

const PROVIDER_LABEL: &str = "bet365 via SportsbookReview";

static RE_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());
static RE_VS_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+vs\.?\s+").unwrap());
static RE_SPREAD_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z .]+)\s+([+-]?\d+(?:\.\d+)?|PK)").unwrap());
static RE_FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// HTML fallback source: a locally saved SportsbookReview odds page named
/// `sbr_week<N>.html`. A missing or unreadable file means no coverage, never
/// an error.
pub struct SbrFallback {
    path: PathBuf,
}

impl SbrFallback {
    pub fn new(dir: &Path, week: u32) -> Self {
        SbrFallback {
            path: dir.join(format!("sbr_week{}.html", week)),
        }
    }
}

#[async_trait]
impl LookupSource for SbrFallback {
    fn name(&self) -> &str {
        "SportsbookReview fallback"
    }

    async fn fetch_lookup(&self, slate: &[SlateEntry]) -> Result<OddsLookup> {
        if !self.path.exists() {
            debug!("Fallback file not found: {}", self.path.display());
            return Ok(OddsLookup::new());
        }

        let html = match std::fs::read_to_string(&self.path) {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    "Unable to read fallback file {}: {}",
                    self.path.display(),
                    err
                );
                return Ok(OddsLookup::new());
            }
        };

        let lookup = parse_fallback_table(&html, slate);
        if !lookup.is_empty() {
            info!(
                "Loaded fallback odds for {} games from {}",
                lookup.len(),
                self.path.display()
            );
        }
        Ok(lookup)
    }
}

/// Parse the odds table out of a saved page: the first `<table>` whose header
/// row leads with a "game" cell and contains a "spread" cell. Rows that fail
/// to match a slate entry, or whose cells fail the grammar, are skipped.
pub fn parse_fallback_table(html: &str, slate: &[SlateEntry]) -> OddsLookup {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let th_selector = Selector::parse("th").unwrap();
    let row_selector = Selector::parse("tbody tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let table = document.select(&table_selector).find(|table| {
        let headers: Vec<String> = table
            .select(&th_selector)
            .map(|th| cell_text(&th).to_lowercase())
            .collect();
        headers
            .first()
            .map_or(false, |first| first.contains("game"))
            && headers.iter().any(|h| h.contains("spread"))
    });
    let table = match table {
        Some(table) => table,
        None => {
            warn!("No odds table found in fallback page");
            return OddsLookup::new();
        }
    };

    let mut lookup = OddsLookup::new();
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < 4 {
            continue;
        }

        let game_text = cell_text(&cells[0]);
        let spread_text = cell_text(&cells[1]);
        let total_text = cell_text(&cells[3]);

        if let Some((key, odds)) = parse_row(&game_text, &spread_text, &total_text, slate) {
            lookup.insert(key, odds);
        }
    }
    lookup
}

fn parse_row(
    game_text: &str,
    spread_text: &str,
    total_text: &str,
    slate: &[SlateEntry],
) -> Option<(super::OddsKey, GameOdds)> {
    // "Away vs Home (annotation)": strip annotations before the vs split.
    let game_core = RE_PARENTHETICAL.replace_all(game_text, "");
    let game_core = game_core.trim();
    let mut sides = RE_VS_SPLIT.splitn(game_core, 2);
    let away_label = sides.next()?.trim();
    let home_label = sides.next()?.trim();
    if home_label.is_empty() || away_label.is_empty() {
        return None;
    }

    let row_aliases = SidedAliases::from_labels(home_label, away_label);
    let (index, swapped) =
        find_oriented(&row_aliases, slate.iter().map(|entry| &entry.aliases))?;
    let entry = &slate[index];
    if swapped {
        debug!("Fallback row for {} listed with sides reversed", entry.label);
    }

    let (favorite, spread) = parse_spread_cell(spread_text, &entry.aliases)?;
    let total = parse_total_cell(total_text);

    Some((
        entry.key.clone(),
        GameOdds {
            spread,
            total,
            provider: PROVIDER_LABEL.to_string(),
            favorite,
            assumed: false,
        },
    ))
}

/// `<team-fragment> <signed-number-or-"PK">`, with "½" meaning ".5" and "PK"
/// (pick'em) meaning a zero spread. The fragment is resolved to a side of the
/// scheduled matchup; a fragment matching both sides is indeterminate and the
/// row is discarded.
fn parse_spread_cell(text: &str, matchup: &SidedAliases) -> Option<(FavoriteSide, f64)> {
    let text = text.replace('½', ".5");
    let caps = RE_SPREAD_CELL.captures(&text)?;
    let fragment = caps.get(1)?.as_str().trim();
    let value_raw = caps.get(2)?.as_str();
    let value: f64 = if value_raw.eq_ignore_ascii_case("PK") {
        0.0
    } else {
        value_raw.parse().ok()?
    };

    let side = match resolve_side(fragment, matchup) {
        SideMatch::Home => FavoriteSide::Home,
        SideMatch::Away => FavoriteSide::Away,
        SideMatch::Ambiguous => {
            warn!("Spread fragment '{}' matches both sides; row discarded", fragment);
            return None;
        }
        SideMatch::Neither => return None,
    };

    // Negative line: the named side is the favorite. Positive: the other
    // side is. Zero (PK) keeps the named side as the nominal favorite.
    if value > 0.0 {
        Some((side.flipped(), -value))
    } else {
        Some((side, value))
    }
}

/// First numeric token of the totals cell, after fraction substitution.
fn parse_total_cell(text: &str) -> Option<f64> {
    let text = text.replace('½', ".5");
    RE_FIRST_NUMBER
        .find(&text)
        .and_then(|m| m.as_str().parse().ok())
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

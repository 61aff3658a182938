//! Odds extraction and reconciliation across heterogeneous sources.

pub mod espn;
pub mod sbr;
pub mod the_odds_api;

pub use espn::EspnOdds;
pub use sbr::SbrFallback;
pub use the_odds_api::TheOddsApi;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::matching::{canonical, SidedAliases};
use crate::models::{FavoriteSide, GameOdds, ScheduledEvent, Team};

/// Canonical (home, away) pair identifying one matchup across sources.
pub type OddsKey = (String, String);

/// Merged per-run view: one odds entry per matched matchup. Built once,
/// read-only afterward.
pub type OddsLookup = HashMap<OddsKey, GameOdds>;

pub fn odds_key(home: &Team, away: &Team) -> OddsKey {
    (canonical(&home.display_name), canonical(&away.display_name))
}

/// One scheduled matchup prepared for source matching: its lookup key, alias
/// sets, and kickoff (bulk sources window their requests on kickoff range).
#[derive(Debug, Clone)]
pub struct SlateEntry {
    pub key: OddsKey,
    pub label: String,
    pub start_utc: DateTime<Utc>,
    pub aliases: SidedAliases,
}

pub fn slate_entries(slate: &[ScheduledEvent]) -> Vec<SlateEntry> {
    slate
        .iter()
        .map(|ev| SlateEntry {
            key: odds_key(&ev.home, &ev.away),
            label: ev.short_label(),
            start_utc: ev.start_utc,
            aliases: SidedAliases::for_matchup(&ev.home, &ev.away),
        })
        .collect()
}

/// A source that can produce a full odds lookup for the week's slate in one
/// shot (as opposed to the per-event primary extractor).
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    async fn fetch_lookup(&self, slate: &[SlateEntry]) -> Result<OddsLookup>;
}

/// Merge a primary lookup with a fallback lookup.
///
/// Per fallback key: a key absent from the primary, or a primary entry whose
/// spread is exactly zero (no real signal), is replaced outright; a primary
/// entry with a spread but no total borrows the fallback's total and keeps
/// everything else, including provider attribution. Primary-only keys pass
/// through unchanged.
pub fn reconcile(primary: OddsLookup, fallback: &OddsLookup) -> OddsLookup {
    let mut merged = primary;
    for (key, fb) in fallback {
        match merged.get(key) {
            None => {
                merged.insert(key.clone(), fb.clone());
            }
            Some(existing) if existing.spread == 0.0 => {
                merged.insert(key.clone(), fb.clone());
            }
            Some(existing) if existing.total.is_none() && fb.total.is_some() => {
                let patched = GameOdds {
                    total: fb.total,
                    ..existing.clone()
                };
                merged.insert(key.clone(), patched);
            }
            Some(_) => {}
        }
    }
    merged
}

/// Last-resort entry when no source covered an event at all: home team
/// assumed favorite at a zero spread, explicitly tagged as a guess.
pub fn assumed_home_odds() -> GameOdds {
    GameOdds {
        spread: 0.0,
        total: None,
        provider: "no listed odds".to_string(),
        favorite: FavoriteSide::Home,
        assumed: true,
    }
}

use chrono::{Datelike, Weekday};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::models::{Event, Pick};

/// Outcome of the Monday tie-breaker computation. "No Monday games" and
/// "Monday games but a total is missing" are distinct states and must be
/// presented differently.
#[derive(Debug, Clone)]
pub enum TieBreaker {
    None,
    Indeterminate {
        games: Vec<Event>,
    },
    Computed {
        games: Vec<Event>,
        combined_total: f64,
        pick: i64,
    },
}

impl TieBreaker {
    pub fn computed_pick(&self) -> Option<i64> {
        match self {
            TieBreaker::Computed { pick, .. } => Some(*pick),
            _ => None,
        }
    }
}

/// Sum the listed totals of the Monday (Eastern) games in the pick set and
/// round half-up to an integer.
pub fn monday_tie_breaker(picks: &[Pick]) -> TieBreaker {
    let games: Vec<Event> = picks
        .iter()
        .filter(|p| p.event.start_local.weekday() == Weekday::Mon)
        .map(|p| p.event.clone())
        .collect();

    if games.is_empty() {
        return TieBreaker::None;
    }
    if games.iter().any(|g| g.total().is_none()) {
        return TieBreaker::Indeterminate { games };
    }

    let combined_total: f64 = games.iter().filter_map(|g| g.total()).sum();
    let pick = round_half_up(combined_total);
    debug!(
        "Monday tie-breaker: {} game(s), combined {} -> {}",
        games.len(),
        combined_total,
        pick
    );
    TieBreaker::Computed {
        games,
        combined_total,
        pick,
    }
}

/// Round to the nearest integer with halves going away from zero. Goes
/// through exact decimal arithmetic on the shortest string form; binary
/// floating point cannot represent x.5 reliably enough to round it.
pub fn round_half_up(value: f64) -> i64 {
    value
        .to_string()
        .parse::<Decimal>()
        .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .ok()
        .and_then(|d| d.to_i64())
        // Unreachable for the bounded totals this is fed; non-finite input
        // falls back to the native rounding.
        .unwrap_or_else(|| value.round() as i64)
}

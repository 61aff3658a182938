use crate::models::{Event, Pick};
use crate::picks::tiebreaker::TieBreaker;

/// Fixed-width pick table: rank, points, selection with its spread label,
/// opponent, kickoff in Eastern time, listed total, and provider attribution
/// (flagged when the entry is an assumption rather than a quote).
pub fn render_pick_table(picks: &[Pick]) -> String {
    if picks.is_empty() {
        return "No games available after filtering.".to_string();
    }

    let header = format!(
        "{:>3}  {:>3}  {:<40}  {:<30}  {:<18}  {:>5}  Provider",
        "Idx", "Pts", "Pick (spread)", "Opponent", "Kickoff (ET)", "O/U"
    );
    let mut lines = vec![header.clone(), "-".repeat(header.len())];

    for (idx, pick) in picks.iter().enumerate() {
        let event = &pick.event;
        let chosen = pick.selected_team();
        let opponent = pick.opponent_team();
        let verb = if pick.is_selected_home() { "vs" } else { "@" };

        let selection = format!(
            "{} ({}) {}",
            chosen.display_name,
            chosen.abbreviation,
            pick.spread_label()
        );
        let opponent_label = format!("{} {} ({})", verb, opponent.display_name, opponent.abbreviation);
        let kickoff = event.start_local.format("%a %m/%d %I:%M %p").to_string();
        let ou = event
            .total()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--".to_string());
        let provider = if event.odds.assumed {
            format!("{} (assumed)", event.odds.provider)
        } else {
            event.odds.provider.clone()
        };

        lines.push(format!(
            "{:>3}  {:>3}  {:<40}  {:<30}  {:<18}  {:>5}  {}",
            idx + 1,
            pick.points,
            selection,
            opponent_label,
            kickoff,
            ou,
            provider
        ));
    }

    lines.join("\n")
}

fn away_at_home(event: &Event) -> String {
    format!(
        "{} ({}) @ {} ({})",
        event.away.display_name,
        event.away.abbreviation,
        event.home.display_name,
        event.home.abbreviation
    )
}

/// One-line tie-breaker summary. The three states render differently on
/// purpose: no Monday game, totals missing (needs a manual number), or a
/// computed pick (optionally overridden by the user).
pub fn format_tie_breaker(tie_breaker: &TieBreaker, override_pick: Option<i64>) -> String {
    match tie_breaker {
        TieBreaker::None => "No Monday game found for tie-breaker.".to_string(),
        TieBreaker::Indeterminate { .. } => {
            "Tie-breaker: at least one Monday game is missing a listed total; enter one manually."
                .to_string()
        }
        TieBreaker::Computed {
            games,
            combined_total,
            pick,
        } => {
            let mut ordered: Vec<&Event> = games.iter().collect();
            ordered.sort_by_key(|g| g.start_utc);
            let details: Vec<String> = ordered
                .iter()
                .map(|g| {
                    let total = g.total().map(|t| t.to_string()).unwrap_or_else(|| "--".to_string());
                    format!(
                        "{} (O/U {}, {})",
                        away_at_home(g),
                        total,
                        g.start_local.format("%a %m/%d %I:%M %p")
                    )
                })
                .collect();
            let final_pick = override_pick.unwrap_or(*pick);
            format!(
                "Tie-breaker (Monday): {} | Combined O/U {} | Total pick {}",
                details.join(" | "),
                combined_total,
                final_pick
            )
        }
    }
}

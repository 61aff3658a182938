//! Stdin adjustment loop: flip a pick between favorite and underdog,
//! reassign its points, and override the tie-breaker total before the final
//! output. EOF at any prompt ends the loop quietly.

use std::io::{self, BufRead, Write};

use crate::models::{Pick, Selection};
use crate::picks::{render_pick_table, TieBreaker};

fn prompt(question: &str) -> Option<String> {
    print!("{}", question);
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

pub fn sort_by_points(picks: &mut [Pick]) {
    picks.sort_by(|a, b| b.points.cmp(&a.points));
}

/// Run the full adjustment session. Returns the user's tie-breaker override,
/// if any; edits are applied to `picks` in place.
pub fn adjust_picks(picks: &mut Vec<Pick>, tie_breaker: &TieBreaker) -> Option<i64> {
    if picks.is_empty() {
        return None;
    }

    loop {
        let response = match prompt("Would you like to edit any picks? [y/N]: ") {
            Some(r) => r.to_lowercase(),
            None => return None,
        };
        match response.as_str() {
            "" | "n" | "no" => break,
            "y" | "yes" => {
                if !edit_loop(picks) {
                    return None;
                }
            }
            _ => println!("Please answer 'y' or 'n'."),
        }
    }

    let override_value = prompt_tie_breaker(tie_breaker);
    sort_by_points(picks);
    override_value
}

/// Returns false on EOF so the caller can stop prompting entirely.
fn edit_loop(picks: &mut Vec<Pick>) -> bool {
    loop {
        println!("\nCurrent picks:");
        sort_by_points(picks);
        println!("{}", render_pick_table(picks));

        let choice =
            match prompt("Enter the game index to edit (or press Enter to finish editing): ") {
                Some(c) => c,
                None => return false,
            };
        if choice.is_empty() {
            return true;
        }
        let index = match choice.parse::<usize>() {
            Ok(n) if (1..=picks.len()).contains(&n) => n - 1,
            _ => {
                println!("Please choose a number between 1 and {}.", picks.len());
                continue;
            }
        };

        if !edit_pick(&mut picks[index]) {
            return false;
        }
        println!("Updated pick saved.\n");
    }
}

fn edit_pick(pick: &mut Pick) -> bool {
    let favorite = pick.event.favorite_team().display_name.clone();
    let underdog = pick.event.underdog_team().display_name.clone();
    println!("Selected: {} vs {}", favorite, underdog);

    let team_prompt = format!(
        "Choose team [1] Favorite ({}) or [2] Underdog ({}) (Enter to keep current): ",
        favorite, underdog
    );
    match prompt(&team_prompt) {
        Some(choice) => match choice.as_str() {
            "1" => pick.selection = Selection::Favorite,
            "2" => pick.selection = Selection::Underdog,
            _ => {}
        },
        None => return false,
    }

    loop {
        let points_input = match prompt(&format!(
            "Assign confidence points (current {}). Press Enter to keep: ",
            pick.points
        )) {
            Some(p) => p,
            None => return false,
        };
        if points_input.is_empty() {
            return true;
        }
        match points_input.parse::<u32>() {
            Ok(points) if points > 0 => {
                pick.points = points;
                return true;
            }
            _ => println!("Points must be a positive whole number."),
        }
    }
}

fn prompt_tie_breaker(tie_breaker: &TieBreaker) -> Option<i64> {
    let question = match tie_breaker {
        TieBreaker::Computed { pick, .. } => format!(
            "Enter a custom Monday tie-breaker total (press Enter to keep {}): ",
            pick
        ),
        TieBreaker::Indeterminate { .. } => {
            "Enter a Monday tie-breaker total (listed totals unavailable; press Enter to skip): "
                .to_string()
        }
        TieBreaker::None => return None,
    };

    loop {
        let input = prompt(&question)?;
        if input.is_empty() || input.eq_ignore_ascii_case("n") || input.eq_ignore_ascii_case("no") {
            return None;
        }
        match input.parse::<i64>() {
            Ok(value) => return Some(value),
            Err(_) => println!("Please enter a whole number."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EventStatus, FavoriteSide, GameOdds, ScheduledEvent, Team, EASTERN,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sort_by_points_descending() {
        let start = Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap();
        let event = |id: &str| {
            ScheduledEvent {
                event_id: id.to_string(),
                competition_id: id.to_string(),
                start_utc: start,
                start_local: start.with_timezone(&EASTERN),
                home: Team::default(),
                away: Team::default(),
                status: EventStatus::Scheduled,
            }
            .with_odds(GameOdds {
                spread: -3.0,
                total: None,
                provider: "test".to_string(),
                favorite: FavoriteSide::Home,
                assumed: false,
            })
        };
        let mut picks = vec![
            Pick::new(event("a"), 3),
            Pick::new(event("b"), 16),
            Pick::new(event("c"), 9),
        ];
        sort_by_points(&mut picks);
        let points: Vec<u32> = picks.iter().map(|p| p.points).collect();
        assert_eq!(points, vec![16, 9, 3]);
    }
}

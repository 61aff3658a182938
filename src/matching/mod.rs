//! Team-identity resolution: canonical name forms, alias-set generation, and
//! event matching across sources that share no identifiers.
//!
//! Matching is alias-set intersection with first-hit-wins traversal. There is
//! deliberately no similarity scoring: a greedy, ordered scan is reproducible
//! and cannot drift into cross-team matches the way a distance metric can.

use std::collections::HashSet;

use crate::models::Team;

/// Collapse a name to its canonical comparable form: lowercase with every
/// character that is not an ASCII letter or digit stripped.
///
/// Total and idempotent; empty input yields empty output.
pub fn canonical(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Derive the ordered alias set for a structured team record.
///
/// Different sources emit identity at different granularities ("Chiefs" vs
/// "Kansas City Chiefs" vs "KC"), so the set has to be broad enough to
/// intersect with any of them while avoiding single generic tokens.
pub fn team_aliases(team: &Team) -> Vec<String> {
    let mut candidates: Vec<String> = vec![
        team.location.clone(),
        team.display_name.clone(),
        team.name.clone(),
        team.short_name.clone(),
        format!("{} {}", team.location, team.name),
        format!("{} {}", team.display_name, team.name),
    ];

    if !team.abbreviation.is_empty() {
        candidates.push(team.abbreviation.clone());
        if !team.name.is_empty() {
            candidates.push(format!("{}{}", team.abbreviation, team.name));
            let prefix: String = team.abbreviation.chars().take(2).collect();
            candidates.push(format!("{}{}", prefix, team.name));
        }
    }

    // Canonicalize, drop empties, dedupe preserving discovery order.
    let mut seen = HashSet::new();
    let mut aliases = Vec::new();
    for candidate in candidates {
        let alias = canonical(&candidate);
        if !alias.is_empty() && seen.insert(alias.clone()) {
            aliases.push(alias);
        }
    }
    aliases
}

/// Derive the alias set for a free-text label (scraped cell, plain-string API
/// name): the whole label, each token, and the join of the last two tokens
/// (so "New England Patriots" also yields "englandpatriots"). Slashes count
/// as whitespace to handle "LA/Los Angeles" style labels.
pub fn label_aliases(label: &str) -> HashSet<String> {
    let cleaned = label.replace('/', " ");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();

    let mut aliases = HashSet::new();
    aliases.insert(canonical(&cleaned));
    for part in &parts {
        aliases.insert(canonical(part));
    }
    if parts.len() >= 2 {
        aliases.insert(canonical(&parts[parts.len() - 2..].join(" ")));
    }
    aliases.retain(|a| !a.is_empty());
    aliases
}

/// The home and away alias sets for one matchup.
#[derive(Debug, Clone, Default)]
pub struct SidedAliases {
    pub home: HashSet<String>,
    pub away: HashSet<String>,
}

impl SidedAliases {
    /// Alias sets for a scheduled matchup: structured aliases plus the
    /// free-text expansion of each display name.
    pub fn for_matchup(home: &Team, away: &Team) -> Self {
        let mut home_set: HashSet<String> = team_aliases(home).into_iter().collect();
        home_set.extend(label_aliases(&home.display_name));
        let mut away_set: HashSet<String> = team_aliases(away).into_iter().collect();
        away_set.extend(label_aliases(&away.display_name));
        SidedAliases {
            home: home_set,
            away: away_set,
        }
    }

    /// Alias sets for a candidate identified only by plain-text names.
    pub fn from_labels(home_label: &str, away_label: &str) -> Self {
        SidedAliases {
            home: label_aliases(home_label),
            away: label_aliases(away_label),
        }
    }
}

fn intersects(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    !a.is_disjoint(b)
}

/// Outcome of matching a target matchup against a candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMatch {
    /// Both sides intersect. `swapped` means the candidate lists the teams in
    /// the opposite home/away orientation, and any home/away-relative fields
    /// extracted from it must be inverted.
    Full { index: usize, swapped: bool },
    /// Only the home side matched. Produced only when no full match exists
    /// anywhere in the pool; callers must log this as a degraded match.
    HomeOnly { index: usize },
}

/// Scan the pool in order for a full two-sided match, trying the direct
/// orientation first and then the crossed one. First acceptable hit wins;
/// pool ordering is a policy lever, not incidental.
pub fn find_oriented<'a, I>(target: &SidedAliases, pool: I) -> Option<(usize, bool)>
where
    I: IntoIterator<Item = &'a SidedAliases>,
{
    for (index, candidate) in pool.into_iter().enumerate() {
        if intersects(&target.home, &candidate.home) && intersects(&target.away, &candidate.away) {
            return Some((index, false));
        }
        if intersects(&target.home, &candidate.away) && intersects(&target.away, &candidate.home) {
            return Some((index, true));
        }
    }
    None
}

/// Like [`find_oriented`], but falls back to a home-side-only scan when the
/// full pass finds nothing. The degraded variant exists for sources that
/// mangle one team's name beyond alias recovery.
pub fn find_match<'a, I>(target: &SidedAliases, pool: I) -> Option<EventMatch>
where
    I: IntoIterator<Item = &'a SidedAliases>,
    I::IntoIter: Clone,
{
    let pool = pool.into_iter();
    if let Some((index, swapped)) = find_oriented(target, pool.clone()) {
        return Some(EventMatch::Full { index, swapped });
    }
    for (index, candidate) in pool.enumerate() {
        if intersects(&target.home, &candidate.home) {
            return Some(EventMatch::HomeOnly { index });
        }
    }
    None
}

/// Which side of a matchup a free-text fragment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideMatch {
    Home,
    Away,
    /// The fragment intersects both alias sets; surfaced, never defaulted.
    Ambiguous,
    Neither,
}

/// Resolve a scraped team fragment ("KC", "Chiefs", "Kansas City") to a side
/// of the matchup.
pub fn resolve_side(fragment: &str, matchup: &SidedAliases) -> SideMatch {
    let aliases = label_aliases(fragment);
    let home = intersects(&aliases, &matchup.home);
    let away = intersects(&aliases, &matchup.away);
    match (home, away) {
        (true, true) => SideMatch::Ambiguous,
        (true, false) => SideMatch::Home,
        (false, true) => SideMatch::Away,
        (false, false) => SideMatch::Neither,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(location: &str, name: &str, abbr: &str) -> Team {
        Team {
            location: location.to_string(),
            display_name: format!("{} {}", location, name),
            name: name.to_string(),
            short_name: name.to_string(),
            abbreviation: abbr.to_string(),
        }
    }

    fn chiefs() -> Team {
        team("Kansas City", "Chiefs", "KC")
    }

    fn raiders() -> Team {
        team("Las Vegas", "Raiders", "LV")
    }

    fn patriots() -> Team {
        team("New England", "Patriots", "NE")
    }

    fn jets() -> Team {
        team("New York", "Jets", "NYJ")
    }

    // ── canonical ────────────────────────────────────────────────────────

    #[test]
    fn test_canonical_strips_case_and_punctuation() {
        assert_eq!(
            canonical("Kansas City Chiefs"),
            canonical("kansas-city CHIEFS")
        );
        assert_eq!(canonical("St. Louis!"), "stlouis");
    }

    #[test]
    fn test_canonical_idempotent() {
        let once = canonical("New York Jets (NYJ)");
        assert_eq!(canonical(&once), once);
    }

    #[test]
    fn test_canonical_empty() {
        assert_eq!(canonical(""), "");
        assert_eq!(canonical("---"), "");
    }

    // ── alias generation ─────────────────────────────────────────────────

    #[test]
    fn test_team_aliases_cover_granularities() {
        let aliases = team_aliases(&chiefs());
        assert!(aliases.contains(&"kansascity".to_string()));
        assert!(aliases.contains(&"kansascitychiefs".to_string()));
        assert!(aliases.contains(&"chiefs".to_string()));
        assert!(aliases.contains(&"kc".to_string()));
        assert!(aliases.contains(&"kcchiefs".to_string()));
    }

    #[test]
    fn test_team_aliases_are_canonical_and_deduped() {
        let aliases = team_aliases(&patriots());
        assert!(!aliases.is_empty());
        for alias in &aliases {
            assert_eq!(&canonical(alias), alias);
        }
        let unique: HashSet<&String> = aliases.iter().collect();
        assert_eq!(unique.len(), aliases.len());
    }

    #[test]
    fn test_team_aliases_empty_team() {
        assert!(team_aliases(&Team::default()).is_empty());
    }

    #[test]
    fn test_label_aliases_tokens_and_tail_pair() {
        let aliases = label_aliases("New England Patriots");
        assert!(aliases.contains("newenglandpatriots"));
        assert!(aliases.contains("patriots"));
        assert!(aliases.contains("englandpatriots"));
    }

    #[test]
    fn test_label_aliases_slash_as_whitespace() {
        let aliases = label_aliases("LA/Los Angeles Chargers");
        assert!(aliases.contains("la"));
        assert!(aliases.contains("chargers"));
        assert!(aliases.contains("losangeleschargers"));
    }

    #[test]
    fn test_label_aliases_empty() {
        assert!(label_aliases("").is_empty());
    }

    // ── event matching ───────────────────────────────────────────────────

    #[test]
    fn test_find_oriented_direct() {
        let target = SidedAliases::for_matchup(&chiefs(), &raiders());
        let pool = vec![
            SidedAliases::from_labels("New England Patriots", "New York Jets"),
            SidedAliases::from_labels("Kansas City Chiefs", "Las Vegas Raiders"),
        ];
        assert_eq!(find_oriented(&target, &pool), Some((1, false)));
    }

    #[test]
    fn test_find_oriented_swapped() {
        let target = SidedAliases::for_matchup(&chiefs(), &raiders());
        let pool = vec![SidedAliases::from_labels(
            "Las Vegas Raiders",
            "Kansas City Chiefs",
        )];
        assert_eq!(find_oriented(&target, &pool), Some((0, true)));
    }

    #[test]
    fn test_find_oriented_no_match() {
        let target = SidedAliases::for_matchup(&chiefs(), &raiders());
        let pool = vec![SidedAliases::from_labels(
            "New England Patriots",
            "New York Jets",
        )];
        assert_eq!(find_oriented(&target, &pool), None);
    }

    #[test]
    fn test_find_oriented_first_hit_wins() {
        let target = SidedAliases::for_matchup(&chiefs(), &raiders());
        let pool = vec![
            SidedAliases::from_labels("Kansas City", "Las Vegas"),
            SidedAliases::from_labels("Kansas City Chiefs", "Las Vegas Raiders"),
        ];
        assert_eq!(find_oriented(&target, &pool), Some((0, false)));
    }

    #[test]
    fn test_find_match_degraded_only_without_full() {
        let target = SidedAliases::for_matchup(&chiefs(), &raiders());
        // Away side unrecognizable: only the degraded path can hit.
        let degraded_pool = vec![SidedAliases::from_labels("Kansas City Chiefs", "???")];
        assert_eq!(
            find_match(&target, &degraded_pool),
            Some(EventMatch::HomeOnly { index: 0 })
        );

        // A full match later in the pool beats an earlier degraded one.
        let mixed_pool = vec![
            SidedAliases::from_labels("Kansas City Chiefs", "???"),
            SidedAliases::from_labels("Kansas City Chiefs", "Las Vegas Raiders"),
        ];
        assert_eq!(
            find_match(&target, &mixed_pool),
            Some(EventMatch::Full {
                index: 1,
                swapped: false
            })
        );
    }

    // ── side resolution ──────────────────────────────────────────────────

    #[test]
    fn test_resolve_side() {
        let matchup = SidedAliases::for_matchup(&patriots(), &jets());
        assert_eq!(resolve_side("Patriots", &matchup), SideMatch::Home);
        assert_eq!(resolve_side("NY Jets", &matchup), SideMatch::Away);
        assert_eq!(resolve_side("Bears", &matchup), SideMatch::Neither);
    }

    #[test]
    fn test_resolve_side_ambiguous() {
        // "New York" intersects both sides of a Giants/Jets matchup.
        let giants = team("New York", "Giants", "NYG");
        let matchup = SidedAliases::for_matchup(&giants, &jets());
        assert_eq!(resolve_side("New York", &matchup), SideMatch::Ambiguous);
    }
}

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OddsSource {
    /// ESPN per-event odds endpoint
    Espn,
    /// The Odds API bulk endpoint, patched by the local SBR fallback file
    TheOddsApi,
}

/// Weekly NFL confidence pick'em generator
#[derive(Parser, Debug, Clone)]
#[command(name = "pickem-bot", version, about)]
pub struct Config {
    /// Regular-season week number (1-18)
    pub week: u32,

    /// Season year (defaults to the season inferred from today's date)
    #[arg(long, env = "SEASON")]
    pub season: Option<i32>,

    /// Highest confidence point value to assign
    #[arg(long, env = "MAX_POINTS", default_value = "16")]
    pub max_points: u32,

    /// Seed for tie-breaking randomization (defaults to season*100 + week)
    #[arg(long, env = "PICKEM_SEED")]
    pub seed: Option<u64>,

    /// Preferred ESPN odds provider (falls back to the first quote with a spread)
    #[arg(long, env = "ESPN_PROVIDER", default_value = "ESPN BET")]
    pub provider: String,

    /// Source for odds data
    #[arg(long, env = "ODDS_SOURCE", value_enum, default_value_t = OddsSource::Espn)]
    pub odds_source: OddsSource,

    /// API key for The Odds API
    #[arg(long, env = "ODDS_API_KEY")]
    pub odds_api_key: Option<String>,

    /// Comma-separated bookmaker preference for The Odds API
    #[arg(
        long,
        env = "ODDS_BOOKMAKERS",
        default_value = "fanduel,draftkings,betmgm"
    )]
    pub odds_bookmakers: String,

    /// Directory containing fallback HTML files named sbr_week<N>.html
    #[arg(long, env = "SBR_FALLBACK_DIR", default_value = "data")]
    pub fallback_dir: PathBuf,

    /// Skip interactive confirmation and editing prompts
    #[arg(long)]
    pub non_interactive: bool,

    /// Fetch current site picks and highlight differences
    #[arg(long)]
    pub compare_existing: bool,

    /// League site user id
    #[arg(long, env = "FTN_USER_ID")]
    pub login_id: Option<String>,

    /// League site access key
    #[arg(long, env = "FTN_KEY")]
    pub login_key: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// ESPN scoreboard endpoint
    #[arg(
        long,
        env = "SCOREBOARD_URL",
        default_value = "https://site.web.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard"
    )]
    pub scoreboard_url: String,

    /// ESPN core odds API base (events/{id}/competitions/{id}/odds lives under it)
    #[arg(
        long,
        env = "ESPN_ODDS_URL",
        default_value = "https://sports.core.api.espn.com/v2/sports/football/leagues/nfl"
    )]
    pub espn_odds_url: String,

    /// The Odds API endpoint
    #[arg(
        long,
        env = "ODDS_API_URL",
        default_value = "https://api.the-odds-api.com/v4/sports/americanfootball_nfl/odds"
    )]
    pub odds_api_url: String,

    /// League site base URL
    #[arg(
        long,
        env = "LEAGUE_SITE_URL",
        default_value = "https://fantasyteamsnetwork.com/play"
    )]
    pub site_url: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=18).contains(&self.week) {
            anyhow::bail!("week must be between 1 and 18");
        }
        if self.odds_source == OddsSource::TheOddsApi && self.odds_api_key.is_none() {
            anyhow::bail!(
                "The Odds API key is required with --odds-source the-odds-api. \
                 Provide --odds-api-key or set ODDS_API_KEY."
            );
        }
        Ok(())
    }

    /// Bookmaker preference list, most preferred first.
    pub fn bookmakers(&self) -> Vec<String> {
        self.odds_bookmakers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Seed for the tie-break shuffle: explicit, or season*100 + week so the
    /// same week reproduces the same ordering.
    pub fn seed_for(&self, season: i32) -> u64 {
        self.seed.unwrap_or(season as u64 * 100 + self.week as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from([&["pickem-bot"], args].concat()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["3"]);
        assert_eq!(config.week, 3);
        assert_eq!(config.max_points, 16);
        assert_eq!(config.odds_source, OddsSource::Espn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bookmakers_parsing() {
        let config = parse(&["3", "--odds-bookmakers", " fanduel, ,betmgm "]);
        assert_eq!(config.bookmakers(), vec!["fanduel", "betmgm"]);
    }

    #[test]
    fn test_validate_week_range() {
        assert!(parse(&["0"]).validate().is_err());
        assert!(parse(&["19"]).validate().is_err());
    }

    #[test]
    fn test_validate_requires_api_key_for_bulk_source() {
        let config = parse(&["3", "--odds-source", "the-odds-api"]);
        assert!(config.validate().is_err());
        let config = parse(&["3", "--odds-source", "the-odds-api", "--odds-api-key", "k"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seed_default_is_season_and_week() {
        let config = parse(&["5"]);
        assert_eq!(config.seed_for(2025), 202505);
        let seeded = parse(&["5", "--seed", "7"]);
        assert_eq!(seeded.seed_for(2025), 7);
    }
}

pub mod espn;

pub use espn::{infer_season_year, Scoreboard};

pub mod assign;
pub mod table;
pub mod tiebreaker;

pub use assign::assign_points;
pub use table::{format_tie_breaker, render_pick_table};
pub use tiebreaker::{monday_tie_breaker, round_half_up, TieBreaker};

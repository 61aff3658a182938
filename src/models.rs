use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// All day-of-week and display rules run on US Eastern kickoff times.
pub const EASTERN: Tz = chrono_tz::America::New_York;

/// A team as supplied by the schedule source. Never mutated; alias sets are
/// derived from these fields on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    pub location: String,
    pub display_name: String,
    pub name: String,
    pub short_name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Scheduled,
    InProgress,
    Final,
}

/// One scheduled game before any odds are attached.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub event_id: String,
    pub competition_id: String,
    pub start_utc: DateTime<Utc>,
    /// Kickoff projected into Eastern time (day-of-week and display rules).
    pub start_local: DateTime<Tz>,
    pub home: Team,
    pub away: Team,
    pub status: EventStatus,
}

impl ScheduledEvent {
    pub fn with_odds(self, odds: GameOdds) -> Event {
        Event {
            event_id: self.event_id,
            competition_id: self.competition_id,
            start_utc: self.start_utc,
            start_local: self.start_local,
            home: self.home,
            away: self.away,
            status: self.status,
            odds,
        }
    }

    /// "AWY @ HOM" label for logs.
    pub fn short_label(&self) -> String {
        format!("{} @ {}", self.away.abbreviation, self.home.abbreviation)
    }
}

/// Which side of a matchup the bookmaker favors. A spread of exactly zero is
/// directionless, so this is always carried explicitly alongside the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteSide {
    Home,
    Away,
}

impl FavoriteSide {
    pub fn flipped(self) -> Self {
        match self {
            FavoriteSide::Home => FavoriteSide::Away,
            FavoriteSide::Away => FavoriteSide::Home,
        }
    }
}

/// A resolved market snapshot for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOdds {
    /// The favorite's line, normalized to be <= 0.0 (more negative = stronger
    /// favorite). Exactly 0.0 means pick'em.
    pub spread: f64,
    /// Combined over/under total, when the source listed one.
    pub total: Option<f64>,
    /// Bookmaker/source attribution, display and audit only.
    pub provider: String,
    pub favorite: FavoriteSide,
    /// True when this entry came from the "home team assumed favorite"
    /// fallback rather than a real quote.
    pub assumed: bool,
}

impl GameOdds {
    pub fn spread_magnitude(&self) -> f64 {
        self.spread.abs()
    }
}

/// One playable game: a scheduled event with its reconciled odds attached.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_id: String,
    pub competition_id: String,
    pub start_utc: DateTime<Utc>,
    pub start_local: DateTime<Tz>,
    pub home: Team,
    pub away: Team,
    pub status: EventStatus,
    pub odds: GameOdds,
}

impl Event {
    pub fn favorite_team(&self) -> &Team {
        match self.odds.favorite {
            FavoriteSide::Home => &self.home,
            FavoriteSide::Away => &self.away,
        }
    }

    pub fn underdog_team(&self) -> &Team {
        match self.odds.favorite {
            FavoriteSide::Home => &self.away,
            FavoriteSide::Away => &self.home,
        }
    }

    pub fn is_favorite_home(&self) -> bool {
        self.odds.favorite == FavoriteSide::Home
    }

    pub fn spread_magnitude(&self) -> f64 {
        self.odds.spread_magnitude()
    }

    pub fn total(&self) -> Option<f64> {
        self.odds.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Favorite,
    Underdog,
}

/// An event paired with assigned confidence points. Produced with
/// `Selection::Favorite`; the interactive layer may flip the selection or
/// reassign points afterwards.
#[derive(Debug, Clone)]
pub struct Pick {
    pub event: Event,
    pub points: u32,
    pub selection: Selection,
}

impl Pick {
    pub fn new(event: Event, points: u32) -> Self {
        Pick {
            event,
            points,
            selection: Selection::Favorite,
        }
    }

    pub fn selected_team(&self) -> &Team {
        match self.selection {
            Selection::Favorite => self.event.favorite_team(),
            Selection::Underdog => self.event.underdog_team(),
        }
    }

    pub fn opponent_team(&self) -> &Team {
        match self.selection {
            Selection::Favorite => self.event.underdog_team(),
            Selection::Underdog => self.event.favorite_team(),
        }
    }

    pub fn is_selected_home(&self) -> bool {
        match self.selection {
            Selection::Favorite => self.event.is_favorite_home(),
            Selection::Underdog => !self.event.is_favorite_home(),
        }
    }

    /// "-7.5" for the favorite, "+7.5" for the underdog.
    pub fn spread_label(&self) -> String {
        let magnitude = self.event.spread_magnitude();
        match self.selection {
            Selection::Favorite => format!("-{}", magnitude),
            Selection::Underdog => format!("+{}", magnitude),
        }
    }
}

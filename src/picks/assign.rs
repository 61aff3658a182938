use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::{Event, Pick};

/// Rank the slate by favorite strength and assign descending confidence
/// points: `max_points` for the strongest favorite, one less per rank.
///
/// The sort key is (spread magnitude, home favorite) descending. The
/// pre-sort shuffle is the tie-break: the sort is stable, so events with
/// exactly equal keys keep their shuffled order, reproducibly for a fixed
/// seed.
///
/// Assignment stops as soon as the computed value would reach zero, capping
/// the pick count at `max_points` no matter how many events exist. Empty
/// input or `max_points == 0` yields an empty list.
pub fn assign_points(events: &[Event], max_points: u32, seed: u64) -> Vec<Pick> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ranked: Vec<Event> = events.to_vec();
    ranked.shuffle(&mut rng);
    ranked.sort_by(|a, b| {
        b.spread_magnitude()
            .total_cmp(&a.spread_magnitude())
            .then_with(|| b.is_favorite_home().cmp(&a.is_favorite_home()))
    });

    let mut picks = Vec::new();
    for (rank, event) in ranked.into_iter().enumerate() {
        let points = max_points as i64 - rank as i64;
        if points <= 0 {
            break;
        }
        picks.push(Pick::new(event, points as u32));
    }
    picks
}

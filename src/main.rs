use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

mod config;
mod interactive;
mod matching;
mod models;
mod odds;
mod picks;
mod schedule;
mod site;
mod slate;

use config::{Config, OddsSource};
use models::{Event, EASTERN};
use odds::{reconcile, EspnOdds, LookupSource, OddsLookup, SbrFallback, TheOddsApi};
use picks::{assign_points, format_tie_breaker, monday_tie_breaker, render_pick_table};
use schedule::{infer_season_year, Scoreboard};
use site::LeagueSite;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Initialise tracing / logging
    let default_filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    config.validate()?;

    let season = config
        .season
        .unwrap_or_else(|| infer_season_year(Utc::now().with_timezone(&EASTERN).date_naive()));
    info!("Building picks for season {} week {}", season, config.week);

    let scoreboard = Scoreboard::new(&config.scoreboard_url)?;
    let scheduled = scoreboard.fetch_week(season, config.week).await?;
    if scheduled.is_empty() {
        anyhow::bail!(
            "No events on the scoreboard for season {} week {}",
            season,
            config.week
        );
    }
    info!("Scoreboard lists {} events", scheduled.len());

    let events = build_slate(&config, scheduled).await?;
    for ev in &events {
        tracing::debug!(
            "Event {} (competition {}, {:?}): favorite {:?}, spread {}, total {:?}, via {}",
            ev.event_id,
            ev.competition_id,
            ev.status,
            ev.odds.favorite,
            ev.odds.spread,
            ev.odds.total,
            ev.odds.provider
        );
    }
    if events.is_empty() {
        println!("No eligible games found. It may be too early for odds or there were filtering issues.");
        return Ok(());
    }

    let seed = config.seed_for(season);
    let mut picks = assign_points(&events, config.max_points, seed);
    if picks.is_empty() {
        println!("No picks generated after applying filters.");
        return Ok(());
    }

    let mut tie_breaker = monday_tie_breaker(&picks);

    println!("{}", render_pick_table(&picks));
    println!();
    println!("{}", format_tie_breaker(&tie_breaker, None));

    if config.compare_existing {
        if config.login_id.is_none() && config.login_key.is_none() {
            warn!("Cannot compare existing picks without --login-id/FTN_USER_ID or --login-key/FTN_KEY");
        } else {
            let league = LeagueSite::new(&config.site_url)?;
            match league
                .fetch_existing(
                    config.week,
                    config.login_id.as_deref(),
                    config.login_key.as_deref(),
                )
                .await
            {
                Ok(existing) => {
                    println!();
                    println!("{}", site::diff_against_site(&picks, &existing, &tie_breaker));
                }
                Err(err) => error!("Failed to fetch existing site picks: {}", err),
            }
        }
    }

    let mut tie_breaker_override = None;
    if !config.non_interactive {
        println!();
        tie_breaker_override = interactive::adjust_picks(&mut picks, &tie_breaker);
        tie_breaker = monday_tie_breaker(&picks);

        println!("\nFinal picks:");
        println!("{}", render_pick_table(&picks));
        println!();
        println!("{}", format_tie_breaker(&tie_breaker, tie_breaker_override));
    }

    if let Some(total) = tie_breaker_override {
        info!("Using custom Monday tie-breaker total: {}", total);
    }

    // The submission boundary: the ordered picks plus this resolved total.
    let final_tie_breaker = tie_breaker_override.or_else(|| tie_breaker.computed_pick());
    match final_tie_breaker {
        Some(total) => println!(
            "\nReady to submit: {} picks, tie-breaker total {}.",
            picks.len(),
            total
        ),
        None => println!("\nReady to submit: {} picks, no tie-breaker total.", picks.len()),
    }

    Ok(())
}

/// Attach odds to the week's schedule from the configured source chain.
async fn build_slate(config: &Config, scheduled: Vec<models::ScheduledEvent>) -> Result<Vec<Event>> {
    match config.odds_source {
        OddsSource::Espn => {
            let source = EspnOdds::new(&config.espn_odds_url, &config.provider)?;
            Ok(slate::assemble_with_espn(scheduled, &source).await)
        }
        OddsSource::TheOddsApi => {
            let entries = odds::slate_entries(&scheduled);

            let sbr = SbrFallback::new(&config.fallback_dir, config.week);
            let fallback = sbr.fetch_lookup(&entries).await?;

            let api_key = config.odds_api_key.as_deref().unwrap_or_default();
            let api = TheOddsApi::new(&config.odds_api_url, api_key, config.bookmakers())?;
            let primary = match api.fetch_lookup(&entries).await {
                Ok(lookup) => lookup,
                // An error status (quota, auth) should be loud; transport
                // failures degrade to the local fallback file alone.
                Err(err) if is_status_error(&err) => return Err(err),
                Err(err) => {
                    warn!(
                        "{} request failed ({}); using local fallback only",
                        api.name(),
                        err
                    );
                    OddsLookup::new()
                }
            };

            if primary.is_empty() && fallback.is_empty() {
                warn!("No odds coverage from any source; home teams will be assumed favorites");
            }

            let lookup = reconcile(primary, &fallback);
            Ok(slate::assemble_with_lookup(scheduled, &lookup))
        }
    }
}

fn is_status_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<reqwest::Error>()
        .map_or(false, reqwest::Error::is_status)
}

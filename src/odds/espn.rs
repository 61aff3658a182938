use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::models::{FavoriteSide, GameOdds};

/// Primary odds source: the ESPN per-event odds endpoint.
///
/// Items may be `$ref` stubs that point at the real record; both forms are
/// handled. The preferred provider's quote wins when it carries a spread,
/// otherwise the first quote with a spread does.
pub struct EspnOdds {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
    preferred_provider: String,
}

impl EspnOdds {
    pub fn new(base_url: &str, preferred_provider: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(EspnOdds {
            http,
            base_url: base_url.to_string(),
            preferred_provider: preferred_provider.to_string(),
        })
    }

    /// Fetch the odds entry for one event, or `None` when the source has no
    /// usable quote (that is "no data", not an error).
    pub async fn fetch_event_odds(
        &self,
        event_id: &str,
        competition_id: &str,
    ) -> Result<Option<GameOdds>> {
        let url = format!(
            "{}/events/{}/competitions/{}/odds",
            self.base_url, event_id, competition_id
        );
        debug!("Fetching odds from {}", url);

        let raw = self.fetch_json(&url).await?;
        let items = match raw["items"].as_array() {
            Some(items) if !items.is_empty() => items,
            _ => return Ok(None),
        };

        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            match item["$ref"].as_str() {
                Some(ref_url) => resolved.push(self.fetch_json(ref_url).await?),
                None => resolved.push(item.clone()),
            }
        }

        Ok(select_item(&resolved, &self.preferred_provider).and_then(odds_from_item))
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(url)
            .query(&[("lang", "en"), ("region", "us")])
            .send()
            .await
            .context("ESPN odds request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("ESPN odds error: {}", resp.status());
        }

        resp.json().await.context("Failed to parse ESPN odds response")
    }
}

/// Pick the quote to use: preferred provider first, then any with a spread.
fn select_item<'a>(items: &'a [serde_json::Value], preferred: &str) -> Option<&'a serde_json::Value> {
    items
        .iter()
        .find(|item| {
            item["provider"]["name"]
                .as_str()
                .map_or(false, |name| name.eq_ignore_ascii_case(preferred))
                && item["spread"].is_number()
        })
        .or_else(|| items.iter().find(|item| item["spread"].is_number()))
}

/// Convert one resolved odds item into a normalized entry.
///
/// Sign convention: negative spread means home favorite, positive means away
/// favorite. An exact zero defers to the explicit favorite flags, defaulting
/// to home when the flags are absent or contradictory. An item without a
/// numeric spread has no directional signal and yields `None`.
fn odds_from_item(item: &serde_json::Value) -> Option<GameOdds> {
    let spread = item["spread"].as_f64()?;
    let total = item["overUnder"].as_f64();
    let provider = item["provider"]["name"]
        .as_str()
        .unwrap_or("Unknown")
        .to_string();

    let favorite = if spread < 0.0 {
        FavoriteSide::Home
    } else if spread > 0.0 {
        FavoriteSide::Away
    } else {
        let home_flag = item["homeTeamOdds"]["favorite"].as_bool().unwrap_or(false);
        let away_flag = item["awayTeamOdds"]["favorite"].as_bool().unwrap_or(false);
        if away_flag && !home_flag {
            FavoriteSide::Away
        } else {
            FavoriteSide::Home
        }
    };

    Some(GameOdds {
        spread: -spread.abs(),
        total,
        provider,
        favorite,
        assumed: false,
    })
}

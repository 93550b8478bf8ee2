//! Flight cost cache for the planner.
//!
//! Writes `flight-prices.json`, keyed by destination airport. Prices are
//! continent-based estimates in AUD; no fare API is queried.

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::Path};
use tracing::{info, instrument, warn};

use crate::config::{
    CACHE_DAYS, CONTINENT_FARES, CURRENCY, DEFAULT_FARE, FLIGHT_CONFIG_FILE, FLIGHT_PRICES_FILE,
    HOME_CONTINENT, SAME_CONTINENT_FARE,
};
use crate::store::{read_json, write_json_atomic};

const ESTIMATE_TYPE: &str = "continent-based";
const API_USED: &str = "AviationStack (estimates only)";
const NOTE: &str = "AviationStack does not provide pricing. These are continent-based estimates. \
                    Consider using Kiwi.com or Skyscanner API for real prices.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightConfig {
    #[serde(rename = "homeAirport")]
    pub home_airport: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPrice {
    pub destination: String,
    pub location_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    pub price: u32,
    pub currency: String,
    pub estimate_type: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub home_airport: String,
    pub last_updated: String,
    pub total_locations: usize,
    pub expires_at: String,
    pub api_used: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightCache {
    pub metadata: CacheMetadata,
    pub prices: BTreeMap<String, FlightPrice>,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn str_field<'a>(rec: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    rec.get(key).and_then(Value::as_str)
}

/// Estimated return fare to `continent`, in AUD.
pub fn estimate_fare(continent: Option<&str>) -> u32 {
    match continent {
        Some(c) if c == HOME_CONTINENT => SAME_CONTINENT_FARE,
        Some(c) => CONTINENT_FARES
            .iter()
            .find(|(name, _)| *name == c)
            .map(|(_, fare)| *fare)
            .unwrap_or(DEFAULT_FARE),
        None => DEFAULT_FARE,
    }
}

/// A location gets a fare when it has a three-letter airport and is not a work trip.
pub fn is_eligible(rec: &Map<String, Value>) -> bool {
    let airport_ok = str_field(rec, "Airport").is_some_and(|a| a.chars().count() == 3);
    airport_ok && str_field(rec, "Location") != Some("Work Trip")
}

/// Build the cache from location records. Later records for the same airport win.
pub fn build_cache(
    locations: &[Map<String, Value>],
    home_airport: Option<&str>,
    now: DateTime<Utc>,
) -> FlightCache {
    let stamp = iso(now);
    let eligible: Vec<_> = locations.iter().filter(|r| is_eligible(r)).collect();
    info!("{} locations have valid airport codes", eligible.len());

    let mut prices = BTreeMap::new();
    for (i, rec) in eligible.iter().enumerate() {
        let destination = str_field(rec, "Airport").unwrap_or_default().to_string();
        let location_name = str_field(rec, "Location")
            .filter(|s| !s.is_empty())
            .or_else(|| str_field(rec, "City"))
            .unwrap_or_default()
            .to_string();
        let continent = str_field(rec, "Continent").map(str::to_string);
        let price = estimate_fare(continent.as_deref());

        info!(
            "[{}/{}] {} ({}) estimated A${}",
            i + 1,
            eligible.len(),
            location_name,
            destination,
            price
        );

        prices.insert(
            destination.clone(),
            FlightPrice {
                destination,
                location_name,
                country: str_field(rec, "Country").map(str::to_string),
                continent,
                price,
                currency: CURRENCY.to_string(),
                estimate_type: ESTIMATE_TYPE.to_string(),
                last_updated: stamp.clone(),
            },
        );
    }

    FlightCache {
        metadata: CacheMetadata {
            home_airport: home_airport.unwrap_or("Not configured").to_string(),
            last_updated: stamp,
            total_locations: eligible.len(),
            expires_at: iso(now + Duration::days(CACHE_DAYS)),
            api_used: API_USED.to_string(),
            note: NOTE.to_string(),
        },
        prices,
    }
}

/// Home airport from the optional config file; problems only warn.
pub fn load_home_airport(path: &Path) -> Option<String> {
    if !path.exists() {
        warn!("No home airport configured; using continent-based estimates only.");
        return None;
    }
    match read_json::<FlightConfig>(path) {
        Ok(cfg) => cfg.home_airport.filter(|a| !a.is_empty()),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Error reading flight config");
            None
        }
    }
}

/// Read `locations.json` from `data_dir` and write `flight-prices.json` next to it.
#[instrument(level = "info", skip(now))]
pub fn write_flight_prices(data_dir: &Path, now: DateTime<Utc>) -> Result<FlightCache> {
    let home = load_home_airport(&data_dir.join(FLIGHT_CONFIG_FILE));
    if let Some(h) = &home {
        info!("Home airport: {}", h);
    }

    let locations: Vec<Map<String, Value>> = read_json(&data_dir.join("locations.json"))?;
    info!("Found {} locations", locations.len());

    let cache = build_cache(&locations, home.as_deref(), now);
    let out = data_dir.join(FLIGHT_PRICES_FILE);
    write_json_atomic(&out, &cache)?;
    info!(
        "Flight prices cached to {} (expires {})",
        out.display(),
        cache.metadata.expires_at
    );
    Ok(cache)
}

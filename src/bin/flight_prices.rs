//! Writes `data/flight-prices.json` from the locations in `data/locations.json`.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use travelprep::{config::DATA_DIR, flights, init_logging};

fn main() -> Result<()> {
    init_logging();
    flights::write_flight_prices(Path::new(DATA_DIR), Utc::now())?;
    Ok(())
}

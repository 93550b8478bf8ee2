//! Fills empty season labels in `data/seasons.json` from the built-in estimates.

use anyhow::Result;
use std::path::Path;
use travelprep::{
    config::{Tab, DATA_DIR},
    init_logging, seasons,
};

fn main() -> Result<()> {
    init_logging();
    let path = Tab::Seasons.path_in(Path::new(DATA_DIR));
    seasons::backfill_file(&path)?;
    Ok(())
}

//! Strips retired columns from `data/locations.json` in place.

use anyhow::Result;
use std::path::Path;
use travelprep::{
    config::{Tab, DATA_DIR, EXCLUDED_FIELDS},
    init_logging, prune,
};

fn main() -> Result<()> {
    init_logging();
    let path = Tab::Locations.path_in(Path::new(DATA_DIR));
    prune::prune_file(&path, EXCLUDED_FIELDS)?;
    Ok(())
}

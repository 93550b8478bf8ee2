use anyhow::Result;
use std::path::Path;
use tracing::info;
use travelprep::{config::DATA_DIR, fetch, init_logging};

fn main() -> Result<()> {
    init_logging();
    info!("startup");

    let client = fetch::build_client()?;
    let data_dir = Path::new(DATA_DIR);
    fetch::fetch_all(&client, data_dir)?;

    info!("all done");
    Ok(())
}

// src/fetch.rs

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::{fs, path::Path, time::Duration};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{export_base_url, Tab, HTTP_TIMEOUT_SECS};
use crate::seasons::{self, SEASON_COLUMNS};
use crate::store::write_json_atomic;
use crate::table::Table;

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .context("building HTTP client")
}

/// CSV export URL for one tab.
pub fn tab_url(tab: Tab) -> Result<Url> {
    let base = export_base_url();
    let mut url = Url::parse(&base).with_context(|| format!("parsing export URL {}", base))?;
    url.query_pairs_mut().append_pair("gid", tab.gid());
    Ok(url)
}

/// GET `url` and return the body; non-2xx statuses are errors.
pub fn fetch_csv(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    client
        .get(url.clone())
        .send()
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .with_context(|| format!("Reading text from {}", url))
}

/// Parse one tab's CSV export and write it to `<out_dir>/<tab>.json`.
///
/// The seasons tab is melted to one record per (location, month) when it has
/// at least 13 columns; narrower exports are written as plain rows.
/// Returns the number of records written.
pub fn write_tab(tab: Tab, csv_text: &str, out_dir: &Path) -> Result<usize> {
    let table = Table::from_csv(csv_text).with_context(|| format!("parsing {} CSV", tab.as_str()))?;
    let path = tab.path_in(out_dir);

    if tab == Tab::Seasons {
        match seasons::melt(&table) {
            Some(records) => {
                write_json_atomic(&path, &records)?;
                info!(
                    "Saved {} season entries (melted from {} rows).",
                    records.len(),
                    table.len()
                );
                return Ok(records.len());
            }
            None => warn!(
                columns = table.width(),
                expected = SEASON_COLUMNS,
                "Unexpected column count in Seasons, saving raw."
            ),
        }
    }

    let records = table.to_records();
    write_json_atomic(&path, &records)?;
    info!("Saved {} {} entries.", records.len(), tab.as_str());
    Ok(records.len())
}

/// Download one tab and write its JSON file.
#[instrument(level = "info", skip(client, out_dir))]
pub fn fetch_tab(client: &Client, tab: Tab, out_dir: &Path) -> Result<usize> {
    let url = tab_url(tab)?;
    info!("Fetching {}...", tab.as_str());
    let text = fetch_csv(client, &url)?;
    write_tab(tab, &text, out_dir)
}

/// Fetch every tab in order, stopping at the first failure.
pub fn fetch_all(client: &Client, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for tab in Tab::ALL {
        fetch_tab(client, tab, out_dir).with_context(|| format!("fetching {} tab", tab.as_str()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seasons::SeasonRecord;
    use crate::store::read_json;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,travelprep=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const SEASONS_CSV: &str = "Events,January,February,March,April,May,June,July,August,September,October,November,December\n\
        Italy,Cold,Cold,Mild,Mild,Good,Best,Best,Hot,Best,Good,Mild,Cold\n\
        France,,,,,,,,,,,,\n";

    #[test]
    fn test_tab_url() {
        let url = tab_url(Tab::Seasons).unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/1wim_IcwX0OCJXeO65bQXkWdpY8Zv-zQVdZ2q72XNCpg/export?format=csv&gid=2088498144"
        );
    }

    #[test]
    fn test_write_locations_keeps_rows_and_columns() {
        init_test_logging();
        let tmp = tempdir().unwrap();
        let csv = "Location,Country,Airport,Cost\nRome,Italy,FCO,1200\nWork Trip,,,\n";

        let n = write_tab(Tab::Locations, csv, tmp.path()).unwrap();
        assert_eq!(n, 2);

        let back: Value = read_json(&tmp.path().join("locations.json")).unwrap();
        assert_eq!(
            back,
            json!([
                {"Location": "Rome", "Country": "Italy", "Airport": "FCO", "Cost": 1200},
                {"Location": "Work Trip", "Country": "", "Airport": "", "Cost": ""}
            ])
        );
    }

    #[test]
    fn test_write_seasons_melts() {
        init_test_logging();
        let tmp = tempdir().unwrap();

        let n = write_tab(Tab::Seasons, SEASONS_CSV, tmp.path()).unwrap();
        assert_eq!(n, 24);

        let back: Vec<SeasonRecord> = read_json(&tmp.path().join("seasons.json")).unwrap();
        assert_eq!(back[0].location, "Italy");
        assert_eq!(back[0].month, "Jan");
        assert_eq!(back[0].quality, "Cold");
        assert_eq!(back[6].month, "Jul");
        assert_eq!(back[6].quality, "Best");
        assert_eq!(back[12].location, "France");
        assert!(back[12..].iter().all(|r| r.quality.is_empty()));
    }

    #[test]
    fn test_narrow_seasons_written_raw() {
        init_test_logging();
        let tmp = tempdir().unwrap();
        let csv = "Location,Jan,Feb\nItaly,Cold,\n";

        let n = write_tab(Tab::Seasons, csv, tmp.path()).unwrap();
        assert_eq!(n, 1);
        let back: Value = read_json(&tmp.path().join("seasons.json")).unwrap();
        assert_eq!(back, json!([{"Location": "Italy", "Jan": "Cold", "Feb": ""}]));
    }

    #[test]
    fn test_parse_failure_leaves_previous_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("timeline.json");
        std::fs::write(&path, "[]").unwrap();

        assert!(write_tab(Tab::Timeline, "a,b\n1,2,3\n", tmp.path()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_fetch_csv_connection_refused_names_url() {
        let client = build_client().unwrap();
        let url = Url::parse("http://127.0.0.1:1/export?gid=0").unwrap();
        let err = fetch_csv(&client, &url).unwrap_err();
        assert!(format!("{:#}", err).contains("GET http://127.0.0.1:1/export?gid=0 failed"));
    }

    #[test]
    fn test_fetch_csv_error_status_names_url() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // drain the request head before answering
            let mut head = Vec::new();
            let mut buf = [0u8; 512];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .unwrap();
        });

        let client = build_client().unwrap();
        let url = Url::parse(&format!("http://{}/export?gid=0", addr)).unwrap();
        let err = fetch_csv(&client, &url).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Non-success status"));
        assert!(msg.contains(url.as_str()));
        server.join().unwrap();
    }

    /// Live check against the real spreadsheet: `cargo test -- --ignored`.
    #[test]
    #[ignore]
    fn test_fetch_all_live() {
        init_test_logging();
        let tmp = tempdir().unwrap();
        let client = build_client().unwrap();
        fetch_all(&client, tmp.path()).unwrap();
        for tab in Tab::ALL {
            assert!(tab.path_in(tmp.path()).exists());
        }
    }
}

// src/config.rs

use std::path::{Path, PathBuf};

/// Spreadsheet holding the locations, timeline and seasons tabs.
pub const SHEET_ID: &str = "1wim_IcwX0OCJXeO65bQXkWdpY8Zv-zQVdZ2q72XNCpg";

/// Directory every command reads from and writes to.
pub const DATA_DIR: &str = "data";

/// Request timeout for the export download.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// CSV export endpoint for `SHEET_ID`; the tab is selected with `gid`.
pub fn export_base_url() -> String {
    format!("https://docs.google.com/spreadsheets/d/{SHEET_ID}/export?format=csv")
}

/// Fields dropped from every location record by `clean_locations`.
pub static EXCLUDED_FIELDS: &[&str] = &[
    "OpenDate",
    "CloseMonth",
    "CamperMon",
    "Campground",
    "OtherCost",
    "CamperCity",
    "CarHire",
    "Bike Hire",
    "DuoAccom",
];

/// One sheet of the source spreadsheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tab {
    Locations,
    Timeline,
    Seasons,
}

impl Tab {
    /// Fetch order.
    pub const ALL: [Tab; 3] = [Tab::Locations, Tab::Timeline, Tab::Seasons];

    pub fn as_str(&self) -> &str {
        match self {
            Tab::Locations => "locations",
            Tab::Timeline => "timeline",
            Tab::Seasons => "seasons",
        }
    }

    pub fn gid(&self) -> &'static str {
        match self {
            Tab::Locations => "0",
            Tab::Timeline => "1665410250",
            Tab::Seasons => "2088498144",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/* ───────────────────────── flight estimates ───────────────────────── */

pub const FLIGHT_PRICES_FILE: &str = "flight-prices.json";
pub const FLIGHT_CONFIG_FILE: &str = "flight-config.json";

/// Continent the home airport sits in; same-continent trips use the short-haul fare.
pub const HOME_CONTINENT: &str = "Oceania";
pub const SAME_CONTINENT_FARE: u32 = 400;
pub const DEFAULT_FARE: u32 = 1200;
pub const CURRENCY: &str = "AUD";
pub const CACHE_DAYS: i64 = 7;

/// Rough return fares in AUD, by destination continent.
pub static CONTINENT_FARES: &[(&str, u32)] = &[
    ("Asia", 800),
    ("Europe", 1800),
    ("North America", 1500),
    ("South America", 2000),
    ("Africa", 1600),
    ("Oceania", 400),
];

//! Customer location loading.

use super::{ColumnIndex, Row};
use crate::error::{AnalyticsError, Result};
use crate::models::CustomerLocation;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const TABLE: &str = "locations";

const CUSTOMER_UNIQUE_ID: &str = "customer_unique_id";
const LATITUDE_ALIASES: &[&str] = &["latitude", "geolocation_lat"];
const LONGITUDE_ALIASES: &[&str] = &["longitude", "geolocation_lng"];

/// Load customer locations from a CSV file.
pub fn load_locations(path: &Path) -> Result<Vec<CustomerLocation>> {
    info!("Loading customer locations from: {}", path.display());
    let file = File::open(path)?;
    read_locations(BufReader::with_capacity(1 << 20, file))
}

/// Read customer locations from any CSV source.
///
/// Rows are returned as-is; use [`dedup_locations`] to keep one row per
/// customer.
pub fn read_locations<R: Read>(reader: R) -> Result<Vec<CustomerLocation>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let index = ColumnIndex::from_headers(TABLE, rdr.headers()?);

    let customer = index.position(CUSTOMER_UNIQUE_ID);
    let latitude = index.first_of(LATITUDE_ALIASES);
    let longitude = index.first_of(LONGITUDE_ALIASES);

    let (customer, latitude, longitude) = match (customer, latitude, longitude) {
        (Some(c), Some(lat), Some(lng)) => (c, lat, lng),
        _ => {
            let mut missing = Vec::new();
            if customer.is_none() {
                missing.push(CUSTOMER_UNIQUE_ID.to_string());
            }
            if latitude.is_none() {
                missing.push(LATITUDE_ALIASES.join("|"));
            }
            if longitude.is_none() {
                missing.push(LONGITUDE_ALIASES.join("|"));
            }
            return Err(AnalyticsError::SchemaMismatch {
                table: TABLE,
                missing,
            });
        }
    };

    let mut locations = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row = Row::new(TABLE, &record);

        locations.push(CustomerLocation {
            customer_unique_id: row.required_text(customer, CUSTOMER_UNIQUE_ID)?,
            latitude: row.coordinate(latitude, "latitude", 90.0)?,
            longitude: row.coordinate(longitude, "longitude", 180.0)?,
        });
    }

    debug!("Read {} location rows", locations.len());
    Ok(locations)
}

/// Keep the first location seen for each customer.
pub fn dedup_locations(locations: Vec<CustomerLocation>) -> Vec<CustomerLocation> {
    let before = locations.len();
    let mut seen = HashSet::new();
    let unique: Vec<_> = locations
        .into_iter()
        .filter(|l| seen.insert(l.customer_unique_id.clone()))
        .collect();

    debug!("Deduplicated locations: {} -> {}", before, unique.len());
    unique
}

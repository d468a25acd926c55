//! Flat transport records for file export and advisory import.
//!
//! # Responsibility
//! - Define the camelCase JSON shape of an exported transport.
//! - Write records as pretty JSON or CSV, read JSON back.
//!
//! # Invariants
//! - Related parties appear by name only; ids of drivers, vehicles and
//!   clients never leave the store.
//! - Importing never touches storage.

use crate::model::transport::{Transport, TransportType};
use crate::model::TransportId;
use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const CSV_HEADERS: [&str; 14] = [
    "ID",
    "Start Point",
    "End Point",
    "Departure Date",
    "Arrival Date",
    "Type",
    "Cargo Description",
    "Cargo Weight",
    "Passenger Count",
    "Price",
    "Paid",
    "Driver",
    "Vehicle",
    "Client",
];

/// One exported transport with its parties resolved to display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRecord {
    pub id: TransportId,
    pub start_point: String,
    pub end_point: String,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub transport_type: TransportType,
    pub cargo_description: Option<String>,
    pub cargo_weight: Option<f64>,
    pub passenger_count: Option<i32>,
    /// Serialized as a decimal string.
    pub price: Decimal,
    pub paid: bool,
    pub driver_name: String,
    pub vehicle_registration_number: String,
    pub client_name: String,
}

impl TransportRecord {
    pub fn from_transport(
        transport: &Transport,
        driver_name: String,
        vehicle_registration_number: String,
        client_name: String,
    ) -> Self {
        Self {
            id: transport.id,
            start_point: transport.start_point.clone(),
            end_point: transport.end_point.clone(),
            departure_date: transport.departure_date,
            arrival_date: transport.arrival_date,
            transport_type: transport.transport_type,
            cargo_description: transport.cargo_description.clone(),
            cargo_weight: transport.cargo_weight,
            passenger_count: transport.passenger_count,
            price: transport.price,
            paid: transport.paid,
            driver_name,
            vehicle_registration_number,
            client_name,
        }
    }

    fn csv_row(&self) -> [String; 14] {
        [
            self.id.to_string(),
            self.start_point.clone(),
            self.end_point.clone(),
            self.departure_date.to_string(),
            self.arrival_date.to_string(),
            self.transport_type.as_str().to_string(),
            self.cargo_description.clone().unwrap_or_default(),
            self.cargo_weight.map(|w| w.to_string()).unwrap_or_default(),
            self.passenger_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
            self.price.to_string(),
            self.paid.to_string(),
            self.driver_name.clone(),
            self.vehicle_registration_number.clone(),
            self.client_name.clone(),
        ]
    }
}

/// Failure while writing an export file.
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "export I/O failed: {err}"),
            Self::Json(err) => write!(f, "JSON encoding failed: {err}"),
            Self::Csv(err) => write!(f, "CSV encoding failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Failure while reading an import file.
#[derive(Debug)]
pub enum ImportError {
    FileNotFound(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "import file not found: {path}"),
            Self::Io(err) => write!(f, "import I/O failed: {err}"),
            Self::Json(err) => write!(f, "malformed import JSON: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FileNotFound(_) => None,
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Pretty-printed JSON array.
pub fn to_json_string(records: &[TransportRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn write_json(records: &[TransportRecord], path: &Path) -> Result<(), ExportError> {
    let json = to_json_string(records)?;
    std::fs::write(path, json)?;
    info!(
        "event=export_json module=export status=ok records={}",
        records.len()
    );
    Ok(())
}

/// Writes a header row and one row per record.
///
/// Fields containing a comma, quote or newline are quoted, inner quotes
/// doubled.
pub fn write_csv<W: Write>(records: &[TransportRecord], writer: W) -> Result<(), ExportError> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);
    csv.write_record(CSV_HEADERS)?;
    for record in records {
        csv.write_record(record.csv_row())?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file(records: &[TransportRecord], path: &Path) -> Result<(), ExportError> {
    write_csv(records, File::create(path)?)?;
    info!(
        "event=export_csv module=export status=ok records={}",
        records.len()
    );
    Ok(())
}

/// Parses a JSON array of records; a literal `null` reads as empty.
pub fn parse_json(json: &str) -> Result<Vec<TransportRecord>, ImportError> {
    let records: Option<Vec<TransportRecord>> = serde_json::from_str(json)?;
    Ok(records.unwrap_or_default())
}

/// Reads records exported by [`write_json`]. Nothing is inserted.
pub fn read_json(path: &Path) -> Result<Vec<TransportRecord>, ImportError> {
    if !path.exists() {
        warn!("event=import_json module=export status=error reason=file_not_found");
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let json = std::fs::read_to_string(path)?;
    let records = parse_json(&json)?;
    info!(
        "event=import_json module=export status=ok records={}",
        records.len()
    );
    Ok(records)
}

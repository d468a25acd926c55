//! Transport job record.
//!
//! # Invariants
//! - Start and end point are never blank.
//! - `arrival_date >= departure_date`.
//! - `price` is strictly positive.
//! - `paid` starts as `false` and only flips through the transport service's
//!   mark-paid/mark-unpaid operations, which also move company revenue.
//! - Cargo fields are meaningful for goods and `passenger_count` for
//!   passengers; this pairing is conventional and not enforced.

use crate::model::validation::{FieldRule, FieldValue, Rule, Validate, ValidationError};
use crate::model::{ClientId, CompanyId, EmployeeId, TransportId, VehicleId, MONEY_SCALE};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportType {
    Passengers,
    Goods,
}

impl TransportType {
    pub const ALL: [TransportType; 2] = [Self::Passengers, Self::Goods];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passengers => "PASSENGERS",
            Self::Goods => "GOODS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Passengers => "Passengers",
            Self::Goods => "Goods",
        }
    }
}

impl Display for TransportType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransportType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ValidationError::single(
                    "transport_type",
                    format!("unknown transport type `{wanted}`"),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub id: TransportId,
    pub company_id: CompanyId,
    pub driver_id: EmployeeId,
    pub vehicle_id: VehicleId,
    pub client_id: ClientId,
    pub start_point: String,
    pub end_point: String,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub transport_type: TransportType,
    pub cargo_description: Option<String>,
    /// Kilograms.
    pub cargo_weight: Option<f64>,
    pub passenger_count: Option<i32>,
    pub price: Decimal,
    pub paid: bool,
}

impl Transport {
    /// Route line such as `Sofia -> Varna`.
    pub fn destination(&self) -> String {
        format!("{} -> {}", self.start_point, self.end_point)
    }
}

/// Unsaved transport; persisted unpaid.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransport {
    pub company_id: CompanyId,
    pub driver_id: EmployeeId,
    pub vehicle_id: VehicleId,
    pub client_id: ClientId,
    pub start_point: String,
    pub end_point: String,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub transport_type: TransportType,
    pub price: Decimal,
    pub cargo_description: Option<String>,
    pub cargo_weight: Option<f64>,
    pub passenger_count: Option<i32>,
}

impl NewTransport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        company_id: CompanyId,
        driver_id: EmployeeId,
        vehicle_id: VehicleId,
        client_id: ClientId,
        start_point: impl Into<String>,
        end_point: impl Into<String>,
        departure_date: NaiveDate,
        arrival_date: NaiveDate,
        transport_type: TransportType,
        price: Decimal,
    ) -> Self {
        Self {
            company_id,
            driver_id,
            vehicle_id,
            client_id,
            start_point: start_point.into(),
            end_point: end_point.into(),
            departure_date,
            arrival_date,
            transport_type,
            price,
            cargo_description: None,
            cargo_weight: None,
            passenger_count: None,
        }
    }

    pub fn with_cargo(mut self, description: impl Into<String>, weight_kg: Option<f64>) -> Self {
        self.cargo_description = Some(description.into());
        self.cargo_weight = weight_kg;
        self
    }

    pub fn with_passengers(mut self, passenger_count: i32) -> Self {
        self.passenger_count = Some(passenger_count);
        self
    }
}

pub(crate) const ARRIVAL_BEFORE_DEPARTURE: &str = "Arrival date cannot be before departure date";

const TRANSPORT_RULES: &[FieldRule] = &[
    FieldRule::new("start_point", Rule::NotBlank, "Start point is required"),
    FieldRule::new("end_point", Rule::NotBlank, "End point is required"),
    FieldRule::new(
        "arrival_date",
        Rule::NotBefore("departure_date"),
        ARRIVAL_BEFORE_DEPARTURE,
    ),
    FieldRule::new("price", Rule::PositiveAtScale(MONEY_SCALE), "Price must be positive"),
];

#[allow(clippy::too_many_arguments)]
fn transport_field<'a>(
    name: &str,
    start_point: &'a str,
    end_point: &'a str,
    departure_date: NaiveDate,
    arrival_date: NaiveDate,
    cargo_description: Option<&'a str>,
    price: Decimal,
) -> FieldValue<'a> {
    match name {
        "start_point" => FieldValue::Text(Some(start_point)),
        "end_point" => FieldValue::Text(Some(end_point)),
        "departure_date" => FieldValue::Date(Some(departure_date)),
        "arrival_date" => FieldValue::Date(Some(arrival_date)),
        "cargo_description" => FieldValue::Text(cargo_description),
        "price" => FieldValue::Amount(Some(price)),
        _ => FieldValue::Unknown,
    }
}

impl Validate for Transport {
    const RULES: &'static [FieldRule] = TRANSPORT_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        transport_field(
            name,
            &self.start_point,
            &self.end_point,
            self.departure_date,
            self.arrival_date,
            self.cargo_description.as_deref(),
            self.price,
        )
    }
}

impl Validate for NewTransport {
    const RULES: &'static [FieldRule] = TRANSPORT_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        transport_field(
            name,
            &self.start_point,
            &self.end_point,
            self.departure_date,
            self.arrival_date,
            self.cargo_description.as_deref(),
            self.price,
        )
    }
}

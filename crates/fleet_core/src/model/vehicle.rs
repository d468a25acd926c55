//! Vehicle record and vehicle types.
//!
//! # Invariants
//! - `registration_number` is never blank and is unique across the store.

use crate::model::validation::{FieldRule, FieldValue, Rule, Validate, ValidationError};
use crate::model::{CompanyId, VehicleId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Bus,
    Truck,
    Tanker,
    Van,
    Car,
}

impl VehicleType {
    pub const ALL: [VehicleType; 5] = [Self::Bus, Self::Truck, Self::Tanker, Self::Van, Self::Car];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bus => "BUS",
            Self::Truck => "TRUCK",
            Self::Tanker => "TANKER",
            Self::Van => "VAN",
            Self::Car => "CAR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bus => "Bus",
            Self::Truck => "Truck",
            Self::Tanker => "Tanker",
            Self::Van => "Van",
            Self::Car => "Car",
        }
    }
}

impl Display for VehicleType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VehicleType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ValidationError::single("vehicle_type", format!("unknown vehicle type `{wanted}`"))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub company_id: CompanyId,
    pub registration_number: String,
    pub vehicle_type: VehicleType,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    /// Seats for buses, tonnes for trucks.
    pub capacity: Option<i32>,
}

impl Vehicle {
    /// Display line such as `Truck Volvo FH (AB1234CD)`.
    pub fn description(&self) -> String {
        let mut description = self.vehicle_type.label().to_string();
        for part in [self.brand.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
        {
            description.push(' ');
            description.push_str(part);
        }
        description.push_str(&format!(" ({})", self.registration_number));
        description
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVehicle {
    pub company_id: CompanyId,
    pub registration_number: String,
    pub vehicle_type: VehicleType,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub capacity: Option<i32>,
}

impl NewVehicle {
    pub fn new(
        company_id: CompanyId,
        registration_number: impl Into<String>,
        vehicle_type: VehicleType,
    ) -> Self {
        Self {
            company_id,
            registration_number: registration_number.into(),
            vehicle_type,
            brand: None,
            model: None,
            year: None,
            capacity: None,
        }
    }

    pub fn with_make(
        mut self,
        brand: impl Into<String>,
        model: impl Into<String>,
        year: Option<i32>,
    ) -> Self {
        self.brand = Some(brand.into());
        self.model = Some(model.into());
        self.year = year;
        self
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

const VEHICLE_RULES: &[FieldRule] = &[FieldRule::new(
    "registration_number",
    Rule::NotBlank,
    "Registration number is required",
)];

impl Validate for Vehicle {
    const RULES: &'static [FieldRule] = VEHICLE_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "registration_number" => FieldValue::Text(Some(self.registration_number.as_str())),
            "brand" => FieldValue::Text(self.brand.as_deref()),
            "model" => FieldValue::Text(self.model.as_deref()),
            _ => FieldValue::Unknown,
        }
    }
}

impl Validate for NewVehicle {
    const RULES: &'static [FieldRule] = VEHICLE_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "registration_number" => FieldValue::Text(Some(self.registration_number.as_str())),
            "brand" => FieldValue::Text(self.brand.as_deref()),
            "model" => FieldValue::Text(self.model.as_deref()),
            _ => FieldValue::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NewVehicle, Vehicle, VehicleType};
    use crate::model::validation::Validate;

    fn truck() -> Vehicle {
        Vehicle {
            id: 1,
            company_id: 1,
            registration_number: "AB1234CD".to_string(),
            vehicle_type: VehicleType::Truck,
            brand: None,
            model: None,
            year: None,
            capacity: None,
        }
    }

    #[test]
    fn description_skips_missing_make() {
        assert_eq!(truck().description(), "Truck (AB1234CD)");

        let mut vehicle = truck();
        vehicle.brand = Some("Volvo".to_string());
        vehicle.model = Some("FH".to_string());
        assert_eq!(vehicle.description(), "Truck Volvo FH (AB1234CD)");
    }

    #[test]
    fn unknown_type_name_is_a_validation_error() {
        let err = "SUBMARINE".parse::<VehicleType>().unwrap_err();
        assert!(err.has_field("vehicle_type"));
        assert_eq!(" tanker ".parse::<VehicleType>().unwrap(), VehicleType::Tanker);
    }

    #[test]
    fn blank_registration_number_is_rejected() {
        let draft = NewVehicle::new(1, "  ", VehicleType::Van);
        assert!(draft.validate().unwrap_err().has_field("registration_number"));
    }
}

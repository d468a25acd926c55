//! Employee (driver) record and driver qualifications.
//!
//! # Invariants
//! - First and last name are never blank.
//! - `salary` is strictly positive.
//! - `phone`, when present, is unique across the whole store (enforced by
//!   the employee service and a storage `UNIQUE` constraint).
//! - Qualifications form a set; order is the enumeration order.

use crate::model::validation::{FieldRule, FieldValue, Rule, Validate, ValidationError};
use crate::model::{CompanyId, EmployeeId, MONEY_SCALE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Credential a driver may hold. Advisory only; not checked on assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Qualification {
    Standard,
    HazardousMaterials,
    FlammableMaterials,
    PassengerTransport,
    HeavyCargo,
    SpecialCargo,
}

impl Qualification {
    pub const ALL: [Qualification; 6] = [
        Self::Standard,
        Self::HazardousMaterials,
        Self::FlammableMaterials,
        Self::PassengerTransport,
        Self::HeavyCargo,
        Self::SpecialCargo,
    ];

    /// Stable persisted/exported name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::HazardousMaterials => "HAZARDOUS_MATERIALS",
            Self::FlammableMaterials => "FLAMMABLE_MATERIALS",
            Self::PassengerTransport => "PASSENGER_TRANSPORT",
            Self::HeavyCargo => "HEAVY_CARGO",
            Self::SpecialCargo => "SPECIAL_CARGO",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard driving licence",
            Self::HazardousMaterials => "Hazardous materials",
            Self::FlammableMaterials => "Flammable materials",
            Self::PassengerTransport => "More than 12 passengers",
            Self::HeavyCargo => "Heavy cargo",
            Self::SpecialCargo => "Special cargo",
        }
    }
}

impl Display for Qualification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Qualification {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ValidationError::single(
                    "qualification",
                    format!("unknown qualification `{wanted}`"),
                )
            })
    }
}

/// Driver employed by one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    /// Owning company. Never changes after creation.
    pub company_id: CompanyId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub salary: Decimal,
    pub qualifications: BTreeSet<Qualification>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Adds a qualification; returns `false` when already held.
    pub fn add_qualification(&mut self, qualification: Qualification) -> bool {
        self.qualifications.insert(qualification)
    }

    /// Removes a qualification; returns `false` when not held.
    pub fn remove_qualification(&mut self, qualification: Qualification) -> bool {
        self.qualifications.remove(&qualification)
    }

    pub fn has_qualification(&self, qualification: Qualification) -> bool {
        self.qualifications.contains(&qualification)
    }
}

/// Unsaved employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub company_id: CompanyId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub salary: Decimal,
    pub qualifications: BTreeSet<Qualification>,
}

impl NewEmployee {
    /// Builds a draft with no phone and no qualifications.
    pub fn new(
        company_id: CompanyId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        salary: Decimal,
    ) -> Self {
        Self {
            company_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            salary,
            qualifications: BTreeSet::new(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_qualifications(
        mut self,
        qualifications: impl IntoIterator<Item = Qualification>,
    ) -> Self {
        self.qualifications.extend(qualifications);
        self
    }
}

const EMPLOYEE_RULES: &[FieldRule] = &[
    FieldRule::new("first_name", Rule::NotBlank, "First name is required"),
    FieldRule::new("last_name", Rule::NotBlank, "Last name is required"),
    FieldRule::new("salary", Rule::PositiveAtScale(MONEY_SCALE), "Salary must be positive"),
];

fn employee_field<'a>(
    name: &str,
    first_name: &'a str,
    last_name: &'a str,
    phone: Option<&'a str>,
    salary: Decimal,
) -> FieldValue<'a> {
    match name {
        "first_name" => FieldValue::Text(Some(first_name)),
        "last_name" => FieldValue::Text(Some(last_name)),
        "phone" => FieldValue::Text(phone),
        "salary" => FieldValue::Amount(Some(salary)),
        _ => FieldValue::Unknown,
    }
}

impl Validate for Employee {
    const RULES: &'static [FieldRule] = EMPLOYEE_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        employee_field(
            name,
            &self.first_name,
            &self.last_name,
            self.phone.as_deref(),
            self.salary,
        )
    }
}

impl Validate for NewEmployee {
    const RULES: &'static [FieldRule] = EMPLOYEE_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        employee_field(
            name,
            &self.first_name,
            &self.last_name,
            self.phone.as_deref(),
            self.salary,
        )
    }
}

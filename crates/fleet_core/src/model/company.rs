//! Company record.
//!
//! # Invariants
//! - `name` is never blank.
//! - `revenue` is a maintained running total of paid transport prices and
//!   never drops below zero.

use crate::model::validation::{FieldRule, FieldValue, Rule, Validate};
use crate::model::CompanyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level tenant owning employees, vehicles, clients and transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: Option<String>,
    /// Sum of prices of the company's currently paid transports.
    pub revenue: Decimal,
}

/// Unsaved company. Revenue always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub address: Option<String>,
}

impl NewCompany {
    pub fn new(name: impl Into<String>, address: Option<String>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

impl Validate for Company {
    const RULES: &'static [FieldRule] = &[
        FieldRule::new("name", Rule::NotBlank, "Company name is required"),
        FieldRule::new(
            "revenue",
            Rule::NonNegative,
            "Revenue must be positive or zero",
        ),
    ];

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(Some(self.name.as_str())),
            "address" => FieldValue::Text(self.address.as_deref()),
            "revenue" => FieldValue::Amount(Some(self.revenue)),
            _ => FieldValue::Unknown,
        }
    }
}

impl Validate for NewCompany {
    const RULES: &'static [FieldRule] = &[FieldRule::new(
        "name",
        Rule::NotBlank,
        "Company name is required",
    )];

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(Some(self.name.as_str())),
            "address" => FieldValue::Text(self.address.as_deref()),
            _ => FieldValue::Unknown,
        }
    }
}

//! Domain model for the transport company ledger.
//!
//! # Responsibility
//! - Define the five record types and their unsaved draft shapes.
//! - Keep closed enumerations and their display labels in one place.
//!
//! # Invariants
//! - Every persisted record carries a store-assigned `i64` identifier.
//! - Children reference their owning company by id only; "children of" views
//!   are derived by store lookups, never held as back-pointer collections.
//! - Persisted records compare and hash by identifier.

pub mod client;
pub mod company;
pub mod employee;
pub mod transport;
pub mod validation;
pub mod vehicle;

/// Identifier of a persisted company.
pub type CompanyId = i64;
/// Identifier of a persisted employee (driver).
pub type EmployeeId = i64;
/// Identifier of a persisted vehicle.
pub type VehicleId = i64;
/// Identifier of a persisted client.
pub type ClientId = i64;
/// Identifier of a persisted transport.
pub type TransportId = i64;

/// Decimal places kept for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Trims optional free text and maps blank values to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

macro_rules! impl_identity {
    ($($record:ty),+ $(,)?) => {
        $(
            impl PartialEq for $record {
                fn eq(&self, other: &Self) -> bool {
                    self.id == other.id
                }
            }

            impl Eq for $record {}

            impl std::hash::Hash for $record {
                fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                    self.id.hash(state);
                }
            }
        )+
    };
}

impl_identity!(
    company::Company,
    employee::Employee,
    vehicle::Vehicle,
    client::Client,
    transport::Transport,
);

#[cfg(test)]
mod tests {
    use super::company::Company;
    use super::normalize_optional;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    #[test]
    fn normalize_optional_drops_blank_text() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" 0888 ".to_string())),
            Some("0888".to_string())
        );
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn records_compare_by_identifier() {
        let first = Company {
            id: 7,
            name: "Acme".to_string(),
            address: None,
            revenue: Decimal::ZERO,
        };
        let mut renamed = first.clone();
        renamed.name = "Acme Ltd".to_string();

        assert_eq!(first, renamed);
        let set: HashSet<Company> = [first, renamed].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}

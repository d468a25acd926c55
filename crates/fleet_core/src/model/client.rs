//! Client record.

use crate::model::transport::Transport;
use crate::model::validation::{FieldRule, FieldValue, Rule, Validate};
use crate::model::{ClientId, CompanyId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub company_id: CompanyId,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Client {
    /// Returns whether every transport of this client in `transports` is paid.
    ///
    /// Works on an already-loaded slice; transports of other clients are
    /// ignored. A client with no transports has paid everything.
    pub fn has_paid_all_transports(&self, transports: &[Transport]) -> bool {
        self.unpaid_transports_count(transports) == 0
    }

    /// Counts this client's unpaid transports within `transports`.
    pub fn unpaid_transports_count(&self, transports: &[Transport]) -> usize {
        transports
            .iter()
            .filter(|transport| transport.client_id == self.id && !transport.paid)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub company_id: CompanyId,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewClient {
    pub fn new(company_id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            company_id,
            name: name.into(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
        }
    }

    pub fn with_contact(
        mut self,
        contact_person: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Self {
        self.contact_person = contact_person;
        self.phone = phone;
        self.email = email;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

const CLIENT_RULES: &[FieldRule] = &[FieldRule::new(
    "name",
    Rule::NotBlank,
    "Client name is required",
)];

impl Validate for Client {
    const RULES: &'static [FieldRule] = CLIENT_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(Some(self.name.as_str())),
            "email" => FieldValue::Text(self.email.as_deref()),
            _ => FieldValue::Unknown,
        }
    }
}

impl Validate for NewClient {
    const RULES: &'static [FieldRule] = CLIENT_RULES;

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(Some(self.name.as_str())),
            "email" => FieldValue::Text(self.email.as_deref()),
            _ => FieldValue::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Client;
    use crate::model::transport::{Transport, TransportType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn client(id: i64) -> Client {
        Client {
            id,
            company_id: 1,
            name: format!("Client {id}"),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
        }
    }

    fn transport(id: i64, client_id: i64, paid: bool) -> Transport {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Transport {
            id,
            company_id: 1,
            driver_id: 1,
            vehicle_id: 1,
            client_id,
            start_point: "Sofia".to_string(),
            end_point: "Varna".to_string(),
            departure_date: day,
            arrival_date: day,
            transport_type: TransportType::Goods,
            cargo_description: None,
            cargo_weight: None,
            passenger_count: None,
            price: Decimal::new(10000, 2),
            paid,
        }
    }

    #[test]
    fn unpaid_count_only_looks_at_own_transports() {
        let transports = vec![
            transport(1, 1, false),
            transport(2, 1, true),
            transport(3, 2, false),
            transport(4, 1, false),
        ];
        assert_eq!(client(1).unpaid_transports_count(&transports), 2);
        assert!(!client(1).has_paid_all_transports(&transports));
        assert_eq!(client(3).unpaid_transports_count(&transports), 0);
        assert!(client(3).has_paid_all_transports(&transports));
    }
}

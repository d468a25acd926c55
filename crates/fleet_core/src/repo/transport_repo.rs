//! Transport persistence and price aggregates.
//!
//! # Invariants
//! - `paid` is written as given; revenue bookkeeping belongs to the service.
//! - Date-range filters keep transports with `departure >= start` and
//!   `arrival <= end`.
//! - Aggregates use `COALESCE(SUM(...), 0)`, so empty sets sum to zero.

use crate::model::transport::{NewTransport, Transport, TransportType};
use crate::model::{normalize_optional, ClientId, CompanyId, EmployeeId, VehicleId};
use crate::repo::store::{delegate_store, Record, SqliteStore};
use crate::repo::{
    bool_to_int, decimal_to_minor, int_to_bool, minor_to_decimal, parse_stored, RepoError,
    RepoResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use rust_decimal::Decimal;

impl Record for Transport {
    type Draft = NewTransport;

    const ENTITY: &'static str = "transport";
    const TABLE: &'static str = "transports";
    const SELECT_SQL: &'static str = "SELECT
    id,
    company_id,
    driver_id,
    vehicle_id,
    client_id,
    start_point,
    end_point,
    departure_date,
    arrival_date,
    transport_type,
    cargo_description,
    cargo_weight,
    passenger_count,
    price_minor,
    paid
FROM transports";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let type_text: String = row.get("transport_type")?;
        Ok(Self {
            id: row.get("id")?,
            company_id: row.get("company_id")?,
            driver_id: row.get("driver_id")?,
            vehicle_id: row.get("vehicle_id")?,
            client_id: row.get("client_id")?,
            start_point: row.get("start_point")?,
            end_point: row.get("end_point")?,
            departure_date: row.get("departure_date")?,
            arrival_date: row.get("arrival_date")?,
            transport_type: parse_stored(&type_text, "transports.transport_type")?,
            cargo_description: row.get("cargo_description")?,
            cargo_weight: row.get("cargo_weight")?,
            passenger_count: row.get("passenger_count")?,
            price: minor_to_decimal(row.get("price_minor")?),
            paid: int_to_bool(row.get("paid")?, "transports.paid")?,
        })
    }

    fn insert(conn: &Connection, draft: &NewTransport) -> RepoResult<i64> {
        conn.execute(
            "INSERT INTO transports (
                company_id,
                driver_id,
                vehicle_id,
                client_id,
                start_point,
                end_point,
                departure_date,
                arrival_date,
                transport_type,
                cargo_description,
                cargo_weight,
                passenger_count,
                price_minor,
                paid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0);",
            params![
                draft.company_id,
                draft.driver_id,
                draft.vehicle_id,
                draft.client_id,
                draft.start_point.trim(),
                draft.end_point.trim(),
                draft.departure_date,
                draft.arrival_date,
                draft.transport_type.as_str(),
                normalize_optional(draft.cargo_description.clone()),
                draft.cargo_weight,
                draft.passenger_count,
                decimal_to_minor("price", draft.price)?,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn write(&self, conn: &Connection) -> RepoResult<usize> {
        Ok(conn.execute(
            "UPDATE transports
             SET
                driver_id = ?1,
                vehicle_id = ?2,
                client_id = ?3,
                start_point = ?4,
                end_point = ?5,
                departure_date = ?6,
                arrival_date = ?7,
                transport_type = ?8,
                cargo_description = ?9,
                cargo_weight = ?10,
                passenger_count = ?11,
                price_minor = ?12,
                paid = ?13
             WHERE id = ?14;",
            params![
                self.driver_id,
                self.vehicle_id,
                self.client_id,
                self.start_point.trim(),
                self.end_point.trim(),
                self.departure_date,
                self.arrival_date,
                self.transport_type.as_str(),
                normalize_optional(self.cargo_description.clone()),
                self.cargo_weight,
                self.passenger_count,
                decimal_to_minor("price", self.price)?,
                bool_to_int(self.paid),
                self.id,
            ],
        )?)
    }
}

/// Selection for price sums and counts. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceFilter {
    pub company_id: Option<CompanyId>,
    pub driver_id: Option<EmployeeId>,
    pub vehicle_id: Option<VehicleId>,
    pub client_id: Option<ClientId>,
    pub paid: Option<bool>,
    /// Inclusive lower bound on `departure_date`.
    pub departure_from: Option<NaiveDate>,
    /// Inclusive upper bound on `arrival_date`.
    pub arrival_until: Option<NaiveDate>,
}

impl PriceFilter {
    pub fn company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Self::default()
        }
    }

    pub fn driver(driver_id: EmployeeId) -> Self {
        Self {
            driver_id: Some(driver_id),
            ..Self::default()
        }
    }

    pub fn vehicle(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            ..Self::default()
        }
    }

    pub fn client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn paid(mut self, paid: bool) -> Self {
        self.paid = Some(paid);
        self
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.departure_from = Some(start);
        self.arrival_until = Some(end);
        self
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(company_id) = self.company_id {
            sql.push_str(" AND company_id = ?");
            bind_values.push(Value::Integer(company_id));
        }
        if let Some(driver_id) = self.driver_id {
            sql.push_str(" AND driver_id = ?");
            bind_values.push(Value::Integer(driver_id));
        }
        if let Some(vehicle_id) = self.vehicle_id {
            sql.push_str(" AND vehicle_id = ?");
            bind_values.push(Value::Integer(vehicle_id));
        }
        if let Some(client_id) = self.client_id {
            sql.push_str(" AND client_id = ?");
            bind_values.push(Value::Integer(client_id));
        }
        if let Some(paid) = self.paid {
            sql.push_str(" AND paid = ?");
            bind_values.push(Value::Integer(bool_to_int(paid)));
        }
        if let Some(start) = self.departure_from {
            sql.push_str(" AND departure_date >= ?");
            bind_values.push(Value::Text(start.to_string()));
        }
        if let Some(end) = self.arrival_until {
            sql.push_str(" AND arrival_date <= ?");
            bind_values.push(Value::Text(end.to_string()));
        }

        (sql, bind_values)
    }
}

/// Transport store plus reference, date and destination queries.
pub struct SqliteTransportRepository<'conn> {
    store: SqliteStore<'conn, Transport>,
}

impl<'conn> SqliteTransportRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            store: SqliteStore::new(conn),
        }
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> RepoResult<Vec<Transport>> {
        self.store
            .query("WHERE company_id = ?1 ORDER BY id ASC", [company_id])
    }

    /// Company transports ordered by end point, then id.
    pub fn find_by_company_sorted_by_destination(
        &self,
        company_id: CompanyId,
    ) -> RepoResult<Vec<Transport>> {
        self.store.query(
            "WHERE company_id = ?1 ORDER BY end_point ASC, id ASC",
            [company_id],
        )
    }

    pub fn find_by_driver(&self, driver_id: EmployeeId) -> RepoResult<Vec<Transport>> {
        self.store
            .query("WHERE driver_id = ?1 ORDER BY id ASC", [driver_id])
    }

    pub fn find_by_vehicle(&self, vehicle_id: VehicleId) -> RepoResult<Vec<Transport>> {
        self.store
            .query("WHERE vehicle_id = ?1 ORDER BY id ASC", [vehicle_id])
    }

    pub fn find_by_client(&self, client_id: ClientId) -> RepoResult<Vec<Transport>> {
        self.store
            .query("WHERE client_id = ?1 ORDER BY id ASC", [client_id])
    }

    pub fn find_unpaid_by_client(&self, client_id: ClientId) -> RepoResult<Vec<Transport>> {
        self.store.query(
            "WHERE client_id = ?1 AND paid = 0 ORDER BY id ASC",
            [client_id],
        )
    }

    /// Company transports departing on/after `start` and arriving on/before `end`.
    pub fn find_by_date_range(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Transport>> {
        self.store.query(
            "WHERE company_id = ?1 AND departure_date >= ?2 AND arrival_date <= ?3
             ORDER BY departure_date ASC, id ASC",
            params![company_id, start, end],
        )
    }

    /// Case-insensitive substring match on start or end point.
    pub fn find_by_destination(
        &self,
        company_id: CompanyId,
        fragment: &str,
    ) -> RepoResult<Vec<Transport>> {
        let needle = fragment.trim().to_lowercase();
        Ok(self
            .find_by_company(company_id)?
            .into_iter()
            .filter(|transport| {
                transport.start_point.to_lowercase().contains(&needle)
                    || transport.end_point.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub fn find_by_transport_type(
        &self,
        company_id: CompanyId,
        transport_type: TransportType,
    ) -> RepoResult<Vec<Transport>> {
        self.store.query(
            "WHERE company_id = ?1 AND transport_type = ?2 ORDER BY id ASC",
            params![company_id, transport_type.as_str()],
        )
    }

    pub fn count_by_company(&self, company_id: CompanyId) -> RepoResult<u64> {
        self.count_matching(&PriceFilter::company(company_id))
    }

    pub fn count_by_driver(&self, driver_id: EmployeeId) -> RepoResult<u64> {
        self.count_matching(&PriceFilter::driver(driver_id))
    }

    pub fn count_by_vehicle(&self, vehicle_id: VehicleId) -> RepoResult<u64> {
        self.count_matching(&PriceFilter::vehicle(vehicle_id))
    }

    pub fn count_by_client(&self, client_id: ClientId) -> RepoResult<u64> {
        self.count_matching(&PriceFilter::client(client_id))
    }

    /// Counts transports of other companies whose driver, vehicle or client
    /// belongs to `company_id`.
    pub fn count_foreign_using_company_parties(&self, company_id: CompanyId) -> RepoResult<u64> {
        self.store.count_where(
            "WHERE company_id <> ?1
               AND (driver_id IN (SELECT id FROM employees WHERE company_id = ?1)
                 OR vehicle_id IN (SELECT id FROM vehicles WHERE company_id = ?1)
                 OR client_id IN (SELECT id FROM clients WHERE company_id = ?1))",
            [company_id],
        )
    }

    /// Counts transports matched by `filter`.
    pub fn count_matching(&self, filter: &PriceFilter) -> RepoResult<u64> {
        let (clause, bind_values) = filter.where_clause();
        self.store
            .count_where(&clause, params_from_iter(bind_values))
    }

    /// Sums prices of transports matched by `filter`; zero when none match.
    pub fn sum_price(&self, filter: &PriceFilter) -> RepoResult<Decimal> {
        let (clause, bind_values) = filter.where_clause();
        let sql = format!("SELECT COALESCE(SUM(price_minor), 0) FROM transports {clause};");
        let total: i64 = self
            .store
            .connection()
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))
            .map_err(RepoError::from)?;
        Ok(minor_to_decimal(total))
    }
}

delegate_store!(SqliteTransportRepository, Transport);

//! Transport use-case service.
//!
//! # Responsibility
//! - Create transports only against existing company, driver, vehicle and
//!   client records.
//! - Drive the paid/unpaid state machine and keep company revenue in step.
//! - Produce the flat export shape with related names resolved.
//!
//! # Invariants
//! - New transports are persisted unpaid.
//! - `Company.revenue` equals the sum of prices of the company's paid
//!   transports after every call that returns `Ok`.
//! - Paid-flag writes and their revenue adjustment share one savepoint.
//! - `update` never changes `paid` or `company_id`.

use crate::db::with_savepoint;
use crate::export::TransportRecord;
use crate::model::client::Client;
use crate::model::company::Company;
use crate::model::employee::Employee;
use crate::model::transport::{
    NewTransport, Transport, TransportType, ARRIVAL_BEFORE_DEPARTURE,
};
use crate::model::validation::{ValidationError, Violation};
use crate::model::vehicle::Vehicle;
use crate::model::{ClientId, CompanyId, EmployeeId, TransportId, VehicleId};
use crate::repo::client_repo::SqliteClientRepository;
use crate::repo::company_repo::SqliteCompanyRepository;
use crate::repo::employee_repo::SqliteEmployeeRepository;
use crate::repo::store::Store;
use crate::repo::transport_repo::{PriceFilter, SqliteTransportRepository};
use crate::repo::vehicle_repo::SqliteVehicleRepository;
use crate::service::{require, require_reference, ServiceResult};
use chrono::NaiveDate;
use log::{error, info};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Instant;

/// Use-case service for transports.
pub struct TransportService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TransportService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteTransportRepository<'conn> {
        SqliteTransportRepository::new(self.conn)
    }

    /// Creates an unpaid transport.
    ///
    /// # Errors
    /// - `ServiceError::Validation` on `arrival_date` when arrival precedes
    ///   departure.
    /// - `ServiceError::Validation` listing every missing reference
    ///   (company, driver, vehicle, client).
    /// - `ServiceError::Validation` when a field rule fails.
    ///
    /// Nothing is written when any check fails.
    pub fn create(&self, draft: &NewTransport) -> ServiceResult<Transport> {
        if draft.arrival_date < draft.departure_date {
            return Err(ValidationError::single("arrival_date", ARRIVAL_BEFORE_DEPARTURE).into());
        }

        let mut violations = Vec::new();
        let companies = SqliteCompanyRepository::new(self.conn);
        if let Err(violation) =
            require_reference::<Company, _>(&companies, "company_id", "Company", draft.company_id)?
        {
            violations.push(violation);
        }
        violations.extend(self.missing_parties(
            draft.driver_id,
            draft.vehicle_id,
            draft.client_id,
        )?);
        if let Some(err) = ValidationError::from_violations(violations) {
            return Err(err.into());
        }

        let transport = self.repo().save(draft)?;
        info!(
            "event=transport_create module=service status=ok transport_id={} company_id={}",
            transport.id, transport.company_id
        );
        Ok(transport)
    }

    /// Replaces route, dates, type, cargo, price and party references.
    ///
    /// `paid` and `company_id` keep their stored values. When the transport
    /// is paid, a price change moves company revenue by the difference in
    /// the same savepoint.
    pub fn update(&self, transport: &Transport) -> ServiceResult<Transport> {
        let started_at = Instant::now();
        let updated = with_savepoint(self.conn, |conn| -> ServiceResult<Transport> {
            let repo = SqliteTransportRepository::new(conn);
            let stored: Transport = require(&repo, transport.id)?;

            let missing = self.missing_parties(
                transport.driver_id,
                transport.vehicle_id,
                transport.client_id,
            )?;
            if let Some(err) = ValidationError::from_violations(missing) {
                return Err(err.into());
            }

            let mut next = transport.clone();
            next.paid = stored.paid;
            next.company_id = stored.company_id;
            let updated = repo.update(&next)?;

            if stored.paid && updated.price != stored.price {
                SqliteCompanyRepository::new(conn)
                    .adjust_revenue(stored.company_id, updated.price - stored.price)?;
            }
            Ok(updated)
        })?;

        info!(
            "event=transport_update module=service status=ok transport_id={} duration_ms={}",
            updated.id,
            started_at.elapsed().as_millis()
        );
        Ok(updated)
    }

    /// Deletes a transport; a paid transport's price leaves company revenue.
    pub fn delete(&self, id: TransportId) -> ServiceResult<()> {
        with_savepoint(self.conn, |conn| -> ServiceResult<()> {
            let repo = SqliteTransportRepository::new(conn);
            let stored: Transport = require(&repo, id)?;
            repo.delete(&stored)?;
            if stored.paid {
                SqliteCompanyRepository::new(conn)
                    .adjust_revenue(stored.company_id, -stored.price)?;
            }
            Ok(())
        })?;

        info!("event=transport_delete module=service status=ok transport_id={id}");
        Ok(())
    }

    /// UNPAID -> PAID; adds the price to company revenue.
    ///
    /// Already paid transports are returned unchanged and revenue is not
    /// touched.
    pub fn mark_as_paid(&self, id: TransportId) -> ServiceResult<Transport> {
        self.set_paid(id, true)
    }

    /// PAID -> UNPAID; subtracts the price from company revenue.
    ///
    /// Already unpaid transports are returned unchanged.
    pub fn mark_as_unpaid(&self, id: TransportId) -> ServiceResult<Transport> {
        self.set_paid(id, false)
    }

    fn set_paid(&self, id: TransportId, paid: bool) -> ServiceResult<Transport> {
        let event = if paid {
            "transport_mark_paid"
        } else {
            "transport_mark_unpaid"
        };
        let started_at = Instant::now();

        let result = with_savepoint(self.conn, |conn| -> ServiceResult<(Transport, bool)> {
            let repo = SqliteTransportRepository::new(conn);
            let mut transport: Transport = require(&repo, id)?;
            if transport.paid == paid {
                return Ok((transport, false));
            }

            transport.paid = paid;
            let updated = repo.update(&transport)?;
            let delta = if paid { updated.price } else { -updated.price };
            SqliteCompanyRepository::new(conn).adjust_revenue(updated.company_id, delta)?;
            Ok((updated, true))
        });

        match result {
            Ok((transport, changed)) => {
                info!(
                    "event={} module=service status=ok transport_id={} changed={} duration_ms={}",
                    event,
                    id,
                    changed,
                    started_at.elapsed().as_millis()
                );
                Ok(transport)
            }
            Err(err) => {
                error!(
                    "event={} module=service status=error transport_id={} duration_ms={} error={}",
                    event,
                    id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn find_by_id(&self, id: TransportId) -> ServiceResult<Option<Transport>> {
        Ok(self.repo().find_by_id(id)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_all()?)
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_company(company_id)?)
    }

    pub fn find_by_company_sorted_by_destination(
        &self,
        company_id: CompanyId,
    ) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_company_sorted_by_destination(company_id)?)
    }

    /// Case-insensitive substring match on start or end point.
    pub fn find_by_destination(
        &self,
        company_id: CompanyId,
        fragment: &str,
    ) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_destination(company_id, fragment)?)
    }

    /// Transports departing on/after `start` and arriving on/before `end`.
    pub fn find_by_date_range(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_date_range(company_id, start, end)?)
    }

    pub fn find_by_transport_type(
        &self,
        company_id: CompanyId,
        transport_type: TransportType,
    ) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_transport_type(company_id, transport_type)?)
    }

    pub fn find_by_driver(&self, driver_id: EmployeeId) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_driver(driver_id)?)
    }

    pub fn find_by_vehicle(&self, vehicle_id: VehicleId) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_vehicle(vehicle_id)?)
    }

    pub fn find_by_client(&self, client_id: ClientId) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_by_client(client_id)?)
    }

    pub fn find_unpaid_by_client(&self, client_id: ClientId) -> ServiceResult<Vec<Transport>> {
        Ok(self.repo().find_unpaid_by_client(client_id)?)
    }

    /// Sum of prices of the company's paid transports.
    pub fn total_revenue_by_company(&self, company_id: CompanyId) -> ServiceResult<Decimal> {
        Ok(self
            .repo()
            .sum_price(&PriceFilter::company(company_id).paid(true))?)
    }

    /// Sum of prices of the driver's paid transports.
    pub fn total_revenue_by_driver(&self, driver_id: EmployeeId) -> ServiceResult<Decimal> {
        Ok(self
            .repo()
            .sum_price(&PriceFilter::driver(driver_id).paid(true))?)
    }

    /// Paid revenue of transports within `[start, end]`.
    pub fn revenue_by_date_range(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Decimal> {
        Ok(self.repo().sum_price(
            &PriceFilter::company(company_id)
                .paid(true)
                .between(start, end),
        )?)
    }

    pub fn count_by_company(&self, company_id: CompanyId) -> ServiceResult<u64> {
        Ok(self.repo().count_by_company(company_id)?)
    }

    pub fn count_by_driver(&self, driver_id: EmployeeId) -> ServiceResult<u64> {
        Ok(self.repo().count_by_driver(driver_id)?)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo().count()?)
    }

    /// Flat export records of the company's transports, in id order.
    pub fn export_records(&self, company_id: CompanyId) -> ServiceResult<Vec<TransportRecord>> {
        let employees = SqliteEmployeeRepository::new(self.conn);
        let vehicles = SqliteVehicleRepository::new(self.conn);
        let clients = SqliteClientRepository::new(self.conn);

        let mut driver_names: HashMap<EmployeeId, String> = HashMap::new();
        let mut registrations: HashMap<VehicleId, String> = HashMap::new();
        let mut client_names: HashMap<ClientId, String> = HashMap::new();
        let mut records = Vec::new();

        for transport in self.repo().find_by_company(company_id)? {
            if !driver_names.contains_key(&transport.driver_id) {
                let driver: Employee = require(&employees, transport.driver_id)?;
                driver_names.insert(driver.id, driver.full_name());
            }
            if !registrations.contains_key(&transport.vehicle_id) {
                let vehicle: Vehicle = require(&vehicles, transport.vehicle_id)?;
                registrations.insert(vehicle.id, vehicle.registration_number);
            }
            if !client_names.contains_key(&transport.client_id) {
                let client: Client = require(&clients, transport.client_id)?;
                client_names.insert(client.id, client.name);
            }

            records.push(TransportRecord::from_transport(
                &transport,
                lookup(&driver_names, transport.driver_id),
                lookup(&registrations, transport.vehicle_id),
                lookup(&client_names, transport.client_id),
            ));
        }

        Ok(records)
    }

    /// Missing driver, vehicle or client references, in that order.
    fn missing_parties(
        &self,
        driver_id: EmployeeId,
        vehicle_id: VehicleId,
        client_id: ClientId,
    ) -> ServiceResult<Vec<Violation>> {
        let mut violations = Vec::new();

        let employees = SqliteEmployeeRepository::new(self.conn);
        if let Err(violation) =
            require_reference::<Employee, _>(&employees, "driver_id", "Driver", driver_id)?
        {
            violations.push(violation);
        }
        let vehicles = SqliteVehicleRepository::new(self.conn);
        if let Err(violation) =
            require_reference::<Vehicle, _>(&vehicles, "vehicle_id", "Vehicle", vehicle_id)?
        {
            violations.push(violation);
        }
        let clients = SqliteClientRepository::new(self.conn);
        if let Err(violation) =
            require_reference::<Client, _>(&clients, "client_id", "Client", client_id)?
        {
            violations.push(violation);
        }

        Ok(violations)
    }
}

fn lookup<K: std::hash::Hash + Eq>(names: &HashMap<K, String>, key: K) -> String {
    names.get(&key).cloned().unwrap_or_default()
}

//! Vehicle use-case service.
//!
//! # Invariants
//! - Registration numbers are unique across the whole store; the check runs
//!   before the owning company is resolved.
//! - A vehicle still used by transports cannot be deleted.

use crate::model::validation::ValidationError;
use crate::model::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::model::{CompanyId, VehicleId};
use crate::repo::store::Store;
use crate::repo::transport_repo::SqliteTransportRepository;
use crate::repo::vehicle_repo::SqliteVehicleRepository;
use crate::service::{ensure_company_exists, require, ServiceResult};
use log::info;
use rusqlite::Connection;

/// Use-case service for vehicles.
pub struct VehicleService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> VehicleService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteVehicleRepository<'conn> {
        SqliteVehicleRepository::new(self.conn)
    }

    /// Registers a vehicle for `draft.company_id`.
    ///
    /// # Errors
    /// - `ServiceError::Validation` when the registration number is taken,
    ///   the company is missing, or a field rule fails.
    pub fn create(&self, draft: &NewVehicle) -> ServiceResult<Vehicle> {
        self.ensure_registration_free(&draft.registration_number, None)?;

        ensure_company_exists(self.conn, draft.company_id)?;

        let vehicle = self.repo().save(draft)?;
        info!(
            "event=vehicle_create module=service status=ok vehicle_id={} company_id={}",
            vehicle.id, vehicle.company_id
        );
        Ok(vehicle)
    }

    /// Replaces registration, type and make; uniqueness is re-checked
    /// against every other vehicle.
    pub fn update(&self, vehicle: &Vehicle) -> ServiceResult<Vehicle> {
        let repo = self.repo();
        let stored: Vehicle = require(&repo, vehicle.id)?;
        self.ensure_registration_free(&vehicle.registration_number, Some(vehicle.id))?;

        let mut next = vehicle.clone();
        next.company_id = stored.company_id;
        Ok(repo.update(&next)?)
    }

    /// Deletes a vehicle that no transport references.
    pub fn delete(&self, id: VehicleId) -> ServiceResult<()> {
        let repo = self.repo();
        let vehicle: Vehicle = require(&repo, id)?;

        let used = SqliteTransportRepository::new(self.conn).count_by_vehicle(id)?;
        if used > 0 {
            return Err(ValidationError::single(
                "id",
                format!("Vehicle {id} is used by {used} transport(s)"),
            )
            .into());
        }

        repo.delete(&vehicle)?;
        info!("event=vehicle_delete module=service status=ok vehicle_id={id}");
        Ok(())
    }

    pub fn find_by_id(&self, id: VehicleId) -> ServiceResult<Option<Vehicle>> {
        Ok(self.repo().find_by_id(id)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Vehicle>> {
        Ok(self.repo().find_all()?)
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> ServiceResult<Vec<Vehicle>> {
        Ok(self.repo().find_by_company(company_id)?)
    }

    pub fn find_by_registration_number(
        &self,
        registration_number: &str,
    ) -> ServiceResult<Option<Vehicle>> {
        Ok(self.repo().find_by_registration_number(registration_number)?)
    }

    pub fn find_by_vehicle_type(
        &self,
        company_id: CompanyId,
        vehicle_type: VehicleType,
    ) -> ServiceResult<Vec<Vehicle>> {
        Ok(self.repo().find_by_vehicle_type(company_id, vehicle_type)?)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo().count()?)
    }

    fn ensure_registration_free(
        &self,
        registration_number: &str,
        owner: Option<VehicleId>,
    ) -> ServiceResult<()> {
        let registration_number = registration_number.trim();
        if registration_number.is_empty() {
            // Blank numbers are rejected by the field rules.
            return Ok(());
        }
        match self.repo().find_by_registration_number(registration_number)? {
            Some(existing) if Some(existing.id) != owner => Err(ValidationError::single(
                "registration_number",
                format!("Vehicle with registration number {registration_number} already exists"),
            )
            .into()),
            _ => Ok(()),
        }
    }
}

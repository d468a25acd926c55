//! Employee use-case service.
//!
//! # Invariants
//! - An employee is created only for an existing company.
//! - Phone numbers are unique across the whole store.
//! - `company_id` is never changed by `update`.
//! - An employee still assigned to transports cannot be deleted.

use crate::model::employee::{Employee, NewEmployee, Qualification};
use crate::model::validation::ValidationError;
use crate::model::{CompanyId, EmployeeId};
use crate::repo::employee_repo::SqliteEmployeeRepository;
use crate::repo::store::Store;
use crate::repo::transport_repo::SqliteTransportRepository;
use crate::service::{ensure_company_exists, require, ServiceResult};
use log::info;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Use-case service for employees (drivers).
pub struct EmployeeService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> EmployeeService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteEmployeeRepository<'conn> {
        SqliteEmployeeRepository::new(self.conn)
    }

    /// Creates an employee of `draft.company_id`.
    ///
    /// # Errors
    /// - `ServiceError::Validation` when the company is missing, the phone is
    ///   taken, or a field rule fails.
    pub fn create(&self, draft: &NewEmployee) -> ServiceResult<Employee> {
        ensure_company_exists(self.conn, draft.company_id)?;
        self.ensure_phone_free(draft.phone.as_deref(), None)?;

        let employee = self.repo().save(draft)?;
        info!(
            "event=employee_create module=service status=ok employee_id={} company_id={}",
            employee.id, employee.company_id
        );
        Ok(employee)
    }

    /// Replaces names, phone, salary and qualifications.
    pub fn update(&self, employee: &Employee) -> ServiceResult<Employee> {
        let repo = self.repo();
        let stored: Employee = require(&repo, employee.id)?;
        self.ensure_phone_free(employee.phone.as_deref(), Some(employee.id))?;

        let mut next = employee.clone();
        next.company_id = stored.company_id;
        Ok(repo.update(&next)?)
    }

    /// Deletes an employee that no transport references.
    pub fn delete(&self, id: EmployeeId) -> ServiceResult<()> {
        let repo = self.repo();
        let employee: Employee = require(&repo, id)?;

        let assigned = SqliteTransportRepository::new(self.conn).count_by_driver(id)?;
        if assigned > 0 {
            return Err(ValidationError::single(
                "id",
                format!("Employee {id} is the driver of {assigned} transport(s)"),
            )
            .into());
        }

        repo.delete(&employee)?;
        info!("event=employee_delete module=service status=ok employee_id={id}");
        Ok(())
    }

    pub fn find_by_id(&self, id: EmployeeId) -> ServiceResult<Option<Employee>> {
        Ok(self.repo().find_by_id(id)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Employee>> {
        Ok(self.repo().find_all()?)
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> ServiceResult<Vec<Employee>> {
        Ok(self.repo().find_by_company(company_id)?)
    }

    pub fn find_by_company_sorted_by_salary(
        &self,
        company_id: CompanyId,
        ascending: bool,
    ) -> ServiceResult<Vec<Employee>> {
        Ok(self
            .repo()
            .find_by_company_sorted_by_salary(company_id, ascending)?)
    }

    pub fn find_by_qualification(
        &self,
        company_id: CompanyId,
        qualification: Qualification,
    ) -> ServiceResult<Vec<Employee>> {
        Ok(self.repo().find_by_qualification(company_id, qualification)?)
    }

    /// Inclusive on both bounds.
    pub fn find_by_salary_range(
        &self,
        company_id: CompanyId,
        min: Decimal,
        max: Decimal,
    ) -> ServiceResult<Vec<Employee>> {
        Ok(self.repo().find_by_salary_range(company_id, min, max)?)
    }

    pub fn add_qualification(
        &self,
        id: EmployeeId,
        qualification: Qualification,
    ) -> ServiceResult<Employee> {
        let repo = self.repo();
        let mut employee: Employee = require(&repo, id)?;
        if !employee.add_qualification(qualification) {
            return Ok(employee);
        }
        Ok(repo.update(&employee)?)
    }

    pub fn remove_qualification(
        &self,
        id: EmployeeId,
        qualification: Qualification,
    ) -> ServiceResult<Employee> {
        let repo = self.repo();
        let mut employee: Employee = require(&repo, id)?;
        if !employee.remove_qualification(qualification) {
            return Ok(employee);
        }
        Ok(repo.update(&employee)?)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo().count()?)
    }

    fn ensure_phone_free(
        &self,
        phone: Option<&str>,
        owner: Option<EmployeeId>,
    ) -> ServiceResult<()> {
        let Some(phone) = phone.map(str::trim).filter(|phone| !phone.is_empty()) else {
            return Ok(());
        };
        match self.repo().find_by_phone(phone)? {
            Some(existing) if Some(existing.id) != owner => Err(ValidationError::single(
                "phone",
                format!("Employee with phone {phone} already exists"),
            )
            .into()),
            _ => Ok(()),
        }
    }
}

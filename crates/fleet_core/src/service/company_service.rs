//! Company use-case service.
//!
//! # Invariants
//! - `update` writes name and address only; revenue moves exclusively through
//!   `update_revenue` and the transport paid-state transitions.
//! - `delete` cascades to every owned record in one savepoint, and refuses
//!   while another company's transport uses one of its parties.

use crate::model::company::{Company, NewCompany};
use crate::model::validation::ValidationError;
use crate::model::CompanyId;
use crate::repo::company_repo::SqliteCompanyRepository;
use crate::repo::store::Store;
use crate::repo::transport_repo::SqliteTransportRepository;
use crate::service::{require, ServiceError, ServiceResult};
use log::info;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Use-case service for companies.
pub struct CompanyService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CompanyService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteCompanyRepository<'conn> {
        SqliteCompanyRepository::new(self.conn)
    }

    /// Creates a company with zero revenue.
    pub fn create(&self, name: &str, address: Option<&str>) -> ServiceResult<Company> {
        let draft = NewCompany::new(name, address.map(str::to_string));
        let company = self.repo().save(&draft)?;
        info!(
            "event=company_create module=service status=ok company_id={}",
            company.id
        );
        Ok(company)
    }

    /// Replaces name and address; the stored revenue is kept.
    ///
    /// # Errors
    /// - `ServiceError::NotFound` when the company does not exist.
    /// - `ServiceError::Validation` when the name is blank.
    pub fn update(&self, company: &Company) -> ServiceResult<Company> {
        let repo = self.repo();
        let mut stored: Company = require(&repo, company.id)?;
        stored.name = company.name.clone();
        stored.address = company.address.clone();
        Ok(repo.update(&stored)?)
    }

    /// Deletes the company and every record it owns.
    ///
    /// # Errors
    /// - `ServiceError::Validation` on `id` when a transport of another
    ///   company uses this company's driver, vehicle or client.
    pub fn delete(&self, id: CompanyId) -> ServiceResult<()> {
        let foreign =
            SqliteTransportRepository::new(self.conn).count_foreign_using_company_parties(id)?;
        if foreign > 0 {
            return Err(ValidationError::single(
                "id",
                format!(
                    "Company {id} has parties used by {foreign} transport(s) of other companies"
                ),
            )
            .into());
        }

        if !self.repo().delete_cascade(id)? {
            return Err(ServiceError::NotFound {
                entity: "company",
                id,
            });
        }
        info!("event=company_delete module=service status=ok company_id={id}");
        Ok(())
    }

    pub fn find_by_id(&self, id: CompanyId) -> ServiceResult<Option<Company>> {
        Ok(self.repo().find_by_id(id)?)
    }

    pub fn find_by_name(&self, name: &str) -> ServiceResult<Option<Company>> {
        Ok(self.repo().find_by_name(name)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Company>> {
        Ok(self.repo().find_all()?)
    }

    pub fn find_all_sorted_by_name(&self) -> ServiceResult<Vec<Company>> {
        Ok(self.repo().find_all_sorted_by_name()?)
    }

    pub fn find_all_sorted_by_revenue(&self) -> ServiceResult<Vec<Company>> {
        Ok(self.repo().find_all_sorted_by_revenue()?)
    }

    /// Adds `delta` (possibly negative) to the company revenue.
    ///
    /// # Errors
    /// - `ServiceError::NotFound` when the company does not exist.
    /// - `ServiceError::Validation` when the result would drop below zero.
    pub fn update_revenue(&self, id: CompanyId, delta: Decimal) -> ServiceResult<Company> {
        let company = self.repo().adjust_revenue(id, delta)?;
        info!(
            "event=company_revenue_adjust module=service status=ok company_id={} delta={}",
            id, delta
        );
        Ok(company)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo().count()?)
    }
}

//! Company persistence.
//!
//! # Invariants
//! - `revenue_minor` never drops below zero; `adjust_revenue` rejects such a
//!   delta before writing.
//! - `delete_cascade` removes every owned row in one savepoint.

use crate::db::with_savepoint;
use crate::model::company::{Company, NewCompany};
use crate::model::validation::ValidationError;
use crate::model::CompanyId;
use crate::repo::store::{delegate_store, Record, SqliteStore, Store};
use crate::repo::{decimal_to_minor, minor_to_decimal, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

impl Record for Company {
    type Draft = NewCompany;

    const ENTITY: &'static str = "company";
    const TABLE: &'static str = "companies";
    const SELECT_SQL: &'static str = "SELECT id, name, address, revenue_minor FROM companies";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            address: row.get("address")?,
            revenue: minor_to_decimal(row.get("revenue_minor")?),
        })
    }

    fn insert(conn: &Connection, draft: &NewCompany) -> RepoResult<i64> {
        conn.execute(
            "INSERT INTO companies (name, address, revenue_minor) VALUES (?1, ?2, 0);",
            params![draft.name.trim(), draft.address.as_deref()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn write(&self, conn: &Connection) -> RepoResult<usize> {
        Ok(conn.execute(
            "UPDATE companies SET name = ?1, address = ?2, revenue_minor = ?3 WHERE id = ?4;",
            params![
                self.name.trim(),
                self.address.as_deref(),
                decimal_to_minor("revenue", self.revenue)?,
                self.id,
            ],
        )?)
    }
}

/// Company store plus name/revenue queries and cascade delete.
pub struct SqliteCompanyRepository<'conn> {
    store: SqliteStore<'conn, Company>,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            store: SqliteStore::new(conn),
        }
    }

    /// Exact, case-sensitive name match; first by id when names repeat.
    pub fn find_by_name(&self, name: &str) -> RepoResult<Option<Company>> {
        self.store
            .query_one("WHERE name = ?1 ORDER BY id ASC LIMIT 1", [name])
    }

    pub fn find_all_sorted_by_name(&self) -> RepoResult<Vec<Company>> {
        self.store.query("ORDER BY name ASC, id ASC", [])
    }

    pub fn find_all_sorted_by_revenue(&self) -> RepoResult<Vec<Company>> {
        self.store.query("ORDER BY revenue_minor DESC, id ASC", [])
    }

    /// Adds `delta` to the stored revenue and returns the updated company.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the company is absent.
    /// - `RepoError::Validation` on `revenue` when the result would be negative.
    pub fn adjust_revenue(&self, id: CompanyId, delta: Decimal) -> RepoResult<Company> {
        with_savepoint(self.store.connection(), |conn| {
            let mut company = self.store.find_by_id(id)?.ok_or(RepoError::NotFound {
                entity: Company::ENTITY,
                id,
            })?;

            let revenue = company.revenue + delta;
            if revenue < Decimal::ZERO {
                return Err(RepoError::Validation(ValidationError::single(
                    "revenue",
                    format!("Revenue cannot become negative ({revenue})"),
                )));
            }

            let revenue_minor = decimal_to_minor("revenue", revenue)?;
            conn.execute(
                "UPDATE companies SET revenue_minor = ?1 WHERE id = ?2;",
                params![revenue_minor, id],
            )?;
            company.revenue = minor_to_decimal(revenue_minor);
            Ok(company)
        })
    }

    /// Deletes the company and everything it owns.
    ///
    /// Order: transports, employee qualifications, employees, vehicles,
    /// clients, company. Returns `false` when the company did not exist.
    pub fn delete_cascade(&self, id: CompanyId) -> RepoResult<bool> {
        with_savepoint(self.store.connection(), |conn| {
            conn.execute("DELETE FROM transports WHERE company_id = ?1;", [id])?;
            conn.execute(
                "DELETE FROM employee_qualifications
                 WHERE employee_id IN (SELECT id FROM employees WHERE company_id = ?1);",
                [id],
            )?;
            conn.execute("DELETE FROM employees WHERE company_id = ?1;", [id])?;
            conn.execute("DELETE FROM vehicles WHERE company_id = ?1;", [id])?;
            conn.execute("DELETE FROM clients WHERE company_id = ?1;", [id])?;
            let removed = conn.execute("DELETE FROM companies WHERE id = ?1;", [id])?;
            Ok(removed > 0)
        })
    }
}

delegate_store!(SqliteCompanyRepository, Company);

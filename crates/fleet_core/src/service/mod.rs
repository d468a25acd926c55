//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce cross-entity invariants the stores cannot see (referenced
//!   parents exist, store-wide uniqueness, revenue bookkeeping).
//!
//! # Invariants
//! - Services borrow the shared connection; they never own storage.
//! - Multi-step writes run inside one savepoint.
//! - Expected failures (`Validation`, `NotFound`) stay distinct from storage
//!   failures (`Repo`).

use crate::model::company::Company;
use crate::model::validation::{ValidationError, Violation};
use crate::model::CompanyId;
use crate::repo::company_repo::SqliteCompanyRepository;
use crate::repo::store::{Record, Store};
use crate::repo::RepoError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client_service;
pub mod company_service;
pub mod employee_service;
pub mod report_service;
pub mod transport_service;
pub mod vehicle_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every domain service.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected: field rules, missing referenced parent, uniqueness.
    Validation(ValidationError),
    /// Mutation targeted an id that does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Storage failure; the write scope was rolled back.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Loads a record a mutation targets, failing with `NotFound` when absent.
pub(crate) fn require<T, S>(store: &S, id: i64) -> ServiceResult<T>
where
    T: Record,
    S: Store<T>,
{
    store.find_by_id(id)?.ok_or(ServiceError::NotFound {
        entity: T::ENTITY,
        id,
    })
}

/// Resolves a referenced parent.
///
/// Absence is reported as a violation on `field` (`"<label> not found with
/// id: <id>"`) so callers can aggregate several missing references.
pub(crate) fn require_reference<T, S>(
    store: &S,
    field: &'static str,
    label: &str,
    id: i64,
) -> ServiceResult<Result<T, Violation>>
where
    T: Record,
    S: Store<T>,
{
    Ok(store.find_by_id(id)?.ok_or_else(|| Violation {
        field: field.to_string(),
        message: format!("{label} not found with id: {id}"),
    }))
}

/// Fails with a `company_id` violation when the company does not exist.
pub(crate) fn ensure_company_exists(conn: &Connection, company_id: CompanyId) -> ServiceResult<()> {
    let companies = SqliteCompanyRepository::new(conn);
    match require_reference::<Company, _>(&companies, "company_id", "Company", company_id)? {
        Ok(_) => Ok(()),
        Err(violation) => Err(ValidationError::single(violation.field, violation.message).into()),
    }
}

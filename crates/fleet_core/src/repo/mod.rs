//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic `Store<T>` capability and its SQLite implementation.
//! - Add per-entity filtered, sorted and aggregate queries on top of it.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes call `Validate::validate()` before SQL mutations.
//! - Reads reject invalid persisted state instead of masking it.
//! - Every mutating call runs inside one savepoint.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::MONEY_SCALE;
use rust_decimal::{Decimal, RoundingStrategy};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client_repo;
pub mod company_repo;
pub mod employee_repo;
pub mod store;
pub mod transport_repo;
pub mod vehicle_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity store.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: i64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Converts a money amount into integer minor units at scale 2.
///
/// Amounts with more fractional digits are rounded half away from zero.
///
/// # Errors
/// - Returns `RepoError::Validation` on `field` when the amount does not fit
///   in a 64-bit column.
pub(crate) fn decimal_to_minor(field: &str, amount: Decimal) -> RepoResult<i64> {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    i64::try_from(rounded.mantissa()).map_err(|_| {
        RepoError::Validation(ValidationError::single(
            field,
            format!("amount {amount} is out of range"),
        ))
    })
}

/// Reads integer minor units back as a scale-2 decimal.
pub(crate) fn minor_to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Parses a persisted enumeration name, reporting the column on failure.
pub(crate) fn parse_stored<E>(value: &str, column: &str) -> RepoResult<E>
where
    E: std::str::FromStr,
{
    value.parse::<E>().map_err(|_| {
        RepoError::InvalidData(format!("invalid value `{value}` in {column}"))
    })
}

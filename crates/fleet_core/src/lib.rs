//! Core record keeping for a transport company.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, FleetConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use export::{ExportError, ImportError, TransportRecord};
pub use ledger::Ledger;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::client::{Client, NewClient};
pub use model::company::{Company, NewCompany};
pub use model::employee::{Employee, NewEmployee, Qualification};
pub use model::transport::{NewTransport, Transport, TransportType};
pub use model::validation::{ValidationError, Violation};
pub use model::vehicle::{NewVehicle, Vehicle, VehicleType};
pub use model::{ClientId, CompanyId, EmployeeId, TransportId, VehicleId};
pub use repo::{RepoError, RepoResult};
pub use service::report_service::{CompanySummary, DriverReport};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

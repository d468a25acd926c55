//! Storage lifecycle for one process.
//!
//! # Responsibility
//! - Own the only SQLite connection and hand it to services by reference.
//! - Release the connection deterministically on `close`.
//!
//! # Invariants
//! - Services borrow the ledger, so none can outlive it.

use crate::config::FleetConfig;
use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::service::client_service::ClientService;
use crate::service::company_service::CompanyService;
use crate::service::employee_service::EmployeeService;
use crate::service::report_service::ReportService;
use crate::service::transport_service::TransportService;
use crate::service::vehicle_service::VehicleService;
use log::info;
use rusqlite::Connection;

/// An open, migrated ledger database.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Opens `config.db_path`, or a fresh in-memory ledger when unset.
    pub fn open(config: &FleetConfig) -> DbResult<Self> {
        let conn = match &config.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn companies(&self) -> CompanyService<'_> {
        CompanyService::new(&self.conn)
    }

    pub fn employees(&self) -> EmployeeService<'_> {
        EmployeeService::new(&self.conn)
    }

    pub fn vehicles(&self) -> VehicleService<'_> {
        VehicleService::new(&self.conn)
    }

    pub fn clients(&self) -> ClientService<'_> {
        ClientService::new(&self.conn)
    }

    pub fn transports(&self) -> TransportService<'_> {
        TransportService::new(&self.conn)
    }

    pub fn reports(&self) -> ReportService<'_> {
        ReportService::new(&self.conn)
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, err)| DbError::Sqlite(err))?;
        info!("event=db_close module=db status=ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::config::FleetConfig;

    #[test]
    fn default_config_opens_empty_in_memory_ledger() {
        let ledger = Ledger::open(&FleetConfig::default()).unwrap();
        assert_eq!(ledger.companies().count().unwrap(), 0);
        ledger.close().unwrap();
    }

    #[test]
    fn file_ledger_keeps_records_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = FleetConfig::default().with_db_path(dir.path().join("fleet.sqlite3"));

        let ledger = Ledger::open(&config).unwrap();
        let company = ledger.companies().create("Acme Ltd", None).unwrap();
        ledger.close().unwrap();

        let reopened = Ledger::open(&config).unwrap();
        let loaded = reopened.companies().find_by_id(company.id).unwrap();
        assert_eq!(loaded.map(|c| c.name), Some("Acme Ltd".to_string()));
    }
}

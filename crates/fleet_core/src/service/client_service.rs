//! Client use-case service.

use crate::model::client::{Client, NewClient};
use crate::model::validation::ValidationError;
use crate::model::{ClientId, CompanyId};
use crate::repo::client_repo::SqliteClientRepository;
use crate::repo::store::Store;
use crate::repo::transport_repo::SqliteTransportRepository;
use crate::service::{ensure_company_exists, require, ServiceResult};
use log::info;
use rusqlite::Connection;

/// Use-case service for clients.
pub struct ClientService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ClientService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteClientRepository<'conn> {
        SqliteClientRepository::new(self.conn)
    }

    /// Creates a client of `draft.company_id`.
    pub fn create(&self, draft: &NewClient) -> ServiceResult<Client> {
        ensure_company_exists(self.conn, draft.company_id)?;

        let client = self.repo().save(draft)?;
        info!(
            "event=client_create module=service status=ok client_id={} company_id={}",
            client.id, client.company_id
        );
        Ok(client)
    }

    /// Replaces name and contact fields; the owning company is kept.
    pub fn update(&self, client: &Client) -> ServiceResult<Client> {
        let repo = self.repo();
        let stored: Client = require(&repo, client.id)?;

        let mut next = client.clone();
        next.company_id = stored.company_id;
        Ok(repo.update(&next)?)
    }

    /// Deletes a client without transports.
    pub fn delete(&self, id: ClientId) -> ServiceResult<()> {
        let repo = self.repo();
        let client: Client = require(&repo, id)?;

        let ordered = SqliteTransportRepository::new(self.conn).count_by_client(id)?;
        if ordered > 0 {
            return Err(ValidationError::single(
                "id",
                format!("Client {id} has {ordered} transport(s)"),
            )
            .into());
        }

        repo.delete(&client)?;
        info!("event=client_delete module=service status=ok client_id={id}");
        Ok(())
    }

    pub fn find_by_id(&self, id: ClientId) -> ServiceResult<Option<Client>> {
        Ok(self.repo().find_by_id(id)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Client>> {
        Ok(self.repo().find_all()?)
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> ServiceResult<Vec<Client>> {
        Ok(self.repo().find_by_company(company_id)?)
    }

    pub fn find_by_name_and_company(
        &self,
        name: &str,
        company_id: CompanyId,
    ) -> ServiceResult<Option<Client>> {
        Ok(self.repo().find_by_name_and_company(name, company_id)?)
    }

    /// Case-insensitive name search across companies.
    pub fn search_by_name(&self, fragment: &str) -> ServiceResult<Vec<Client>> {
        Ok(self.repo().search_by_name(fragment)?)
    }

    /// Clients of the company with at least one unpaid transport.
    ///
    /// Clients without transports, or with only paid ones, are excluded.
    pub fn find_clients_with_unpaid_transports(
        &self,
        company_id: CompanyId,
    ) -> ServiceResult<Vec<Client>> {
        Ok(self.repo().find_with_unpaid_transports(company_id)?)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo().count()?)
    }
}

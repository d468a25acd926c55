//! Client persistence.

use crate::model::client::{Client, NewClient};
use crate::model::{normalize_optional, CompanyId};
use crate::repo::store::{delegate_store, Record, SqliteStore, Store};
use crate::repo::RepoResult;
use rusqlite::{params, Connection, Row};

impl Record for Client {
    type Draft = NewClient;

    const ENTITY: &'static str = "client";
    const TABLE: &'static str = "clients";
    const SELECT_SQL: &'static str =
        "SELECT id, company_id, name, contact_person, phone, email, address FROM clients";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            company_id: row.get("company_id")?,
            name: row.get("name")?,
            contact_person: row.get("contact_person")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
            address: row.get("address")?,
        })
    }

    fn insert(conn: &Connection, draft: &NewClient) -> RepoResult<i64> {
        conn.execute(
            "INSERT INTO clients (company_id, name, contact_person, phone, email, address)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                draft.company_id,
                draft.name.trim(),
                normalize_optional(draft.contact_person.clone()),
                normalize_optional(draft.phone.clone()),
                normalize_optional(draft.email.clone()),
                normalize_optional(draft.address.clone()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn write(&self, conn: &Connection) -> RepoResult<usize> {
        Ok(conn.execute(
            "UPDATE clients
             SET name = ?1, contact_person = ?2, phone = ?3, email = ?4, address = ?5
             WHERE id = ?6;",
            params![
                self.name.trim(),
                normalize_optional(self.contact_person.clone()),
                normalize_optional(self.phone.clone()),
                normalize_optional(self.email.clone()),
                normalize_optional(self.address.clone()),
                self.id,
            ],
        )?)
    }
}

/// Client store plus name and payment-state queries.
pub struct SqliteClientRepository<'conn> {
    store: SqliteStore<'conn, Client>,
}

impl<'conn> SqliteClientRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            store: SqliteStore::new(conn),
        }
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> RepoResult<Vec<Client>> {
        self.store
            .query("WHERE company_id = ?1 ORDER BY id ASC", [company_id])
    }

    /// Exact name match within one company.
    pub fn find_by_name_and_company(
        &self,
        name: &str,
        company_id: CompanyId,
    ) -> RepoResult<Option<Client>> {
        self.store.query_one(
            "WHERE name = ?1 AND company_id = ?2 ORDER BY id ASC LIMIT 1",
            params![name.trim(), company_id],
        )
    }

    /// Company clients with at least one unpaid transport, each listed once.
    pub fn find_with_unpaid_transports(&self, company_id: CompanyId) -> RepoResult<Vec<Client>> {
        self.store.query(
            "WHERE company_id = ?1
               AND EXISTS (
                   SELECT 1 FROM transports
                   WHERE transports.client_id = clients.id AND transports.paid = 0
               )
             ORDER BY id ASC",
            [company_id],
        )
    }

    /// Case-insensitive substring match on the client name, across companies.
    ///
    /// Matching runs in Rust so non-ASCII names fold the same way as ASCII.
    pub fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Client>> {
        let needle = fragment.trim().to_lowercase();
        Ok(self
            .store
            .find_all()?
            .into_iter()
            .filter(|client| client.name.to_lowercase().contains(&needle))
            .collect())
    }
}

delegate_store!(SqliteClientRepository, Client);

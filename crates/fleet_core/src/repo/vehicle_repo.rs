//! Vehicle persistence.

use crate::model::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::model::{normalize_optional, CompanyId};
use crate::repo::store::{delegate_store, Record, SqliteStore};
use crate::repo::{parse_stored, RepoResult};
use rusqlite::{params, Connection, Row};

impl Record for Vehicle {
    type Draft = NewVehicle;

    const ENTITY: &'static str = "vehicle";
    const TABLE: &'static str = "vehicles";
    const SELECT_SQL: &'static str = "SELECT
    id,
    company_id,
    registration_number,
    vehicle_type,
    brand,
    model,
    year,
    capacity
FROM vehicles";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let type_text: String = row.get("vehicle_type")?;
        Ok(Self {
            id: row.get("id")?,
            company_id: row.get("company_id")?,
            registration_number: row.get("registration_number")?,
            vehicle_type: parse_stored(&type_text, "vehicles.vehicle_type")?,
            brand: row.get("brand")?,
            model: row.get("model")?,
            year: row.get("year")?,
            capacity: row.get("capacity")?,
        })
    }

    fn insert(conn: &Connection, draft: &NewVehicle) -> RepoResult<i64> {
        conn.execute(
            "INSERT INTO vehicles (
                company_id,
                registration_number,
                vehicle_type,
                brand,
                model,
                year,
                capacity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                draft.company_id,
                draft.registration_number.trim(),
                draft.vehicle_type.as_str(),
                normalize_optional(draft.brand.clone()),
                normalize_optional(draft.model.clone()),
                draft.year,
                draft.capacity,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn write(&self, conn: &Connection) -> RepoResult<usize> {
        Ok(conn.execute(
            "UPDATE vehicles
             SET
                registration_number = ?1,
                vehicle_type = ?2,
                brand = ?3,
                model = ?4,
                year = ?5,
                capacity = ?6
             WHERE id = ?7;",
            params![
                self.registration_number.trim(),
                self.vehicle_type.as_str(),
                normalize_optional(self.brand.clone()),
                normalize_optional(self.model.clone()),
                self.year,
                self.capacity,
                self.id,
            ],
        )?)
    }
}

/// Vehicle store plus registration and type lookups.
pub struct SqliteVehicleRepository<'conn> {
    store: SqliteStore<'conn, Vehicle>,
}

impl<'conn> SqliteVehicleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            store: SqliteStore::new(conn),
        }
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> RepoResult<Vec<Vehicle>> {
        self.store
            .query("WHERE company_id = ?1 ORDER BY id ASC", [company_id])
    }

    /// Store-wide lookup; surrounding whitespace is ignored.
    pub fn find_by_registration_number(
        &self,
        registration_number: &str,
    ) -> RepoResult<Option<Vehicle>> {
        self.store
            .query_one("WHERE registration_number = ?1", [registration_number.trim()])
    }

    pub fn find_by_vehicle_type(
        &self,
        company_id: CompanyId,
        vehicle_type: VehicleType,
    ) -> RepoResult<Vec<Vehicle>> {
        self.store.query(
            "WHERE company_id = ?1 AND vehicle_type = ?2 ORDER BY id ASC",
            params![company_id, vehicle_type.as_str()],
        )
    }
}

delegate_store!(SqliteVehicleRepository, Vehicle);

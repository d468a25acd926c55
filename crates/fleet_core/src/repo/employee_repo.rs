//! Employee persistence.
//!
//! # Invariants
//! - Qualifications live in `employee_qualifications` and are replaced as a
//!   whole set on every write, inside the caller's savepoint.
//! - Company-scoped queries order by id unless a sort is requested.

use crate::model::employee::{Employee, NewEmployee, Qualification};
use crate::model::{normalize_optional, CompanyId, EmployeeId};
use crate::repo::store::{delegate_store, Record, SqliteStore};
use crate::repo::{decimal_to_minor, minor_to_decimal, parse_stored, RepoResult};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

impl Record for Employee {
    type Draft = NewEmployee;

    const ENTITY: &'static str = "employee";
    const TABLE: &'static str = "employees";
    const SELECT_SQL: &'static str =
        "SELECT id, company_id, first_name, last_name, phone, salary_minor FROM employees";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            company_id: row.get("company_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            phone: row.get("phone")?,
            salary: minor_to_decimal(row.get("salary_minor")?),
            qualifications: BTreeSet::new(),
        })
    }

    fn insert(conn: &Connection, draft: &NewEmployee) -> RepoResult<i64> {
        conn.execute(
            "INSERT INTO employees (company_id, first_name, last_name, phone, salary_minor)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.company_id,
                draft.first_name.trim(),
                draft.last_name.trim(),
                normalize_optional(draft.phone.clone()),
                decimal_to_minor("salary", draft.salary)?,
            ],
        )?;
        let id = conn.last_insert_rowid();
        replace_qualifications(conn, id, &draft.qualifications)?;
        Ok(id)
    }

    fn write(&self, conn: &Connection) -> RepoResult<usize> {
        let changed = conn.execute(
            "UPDATE employees
             SET first_name = ?1, last_name = ?2, phone = ?3, salary_minor = ?4
             WHERE id = ?5;",
            params![
                self.first_name.trim(),
                self.last_name.trim(),
                normalize_optional(self.phone.clone()),
                decimal_to_minor("salary", self.salary)?,
                self.id,
            ],
        )?;
        if changed > 0 {
            replace_qualifications(conn, self.id, &self.qualifications)?;
        }
        Ok(changed)
    }

    fn load_related(&mut self, conn: &Connection) -> RepoResult<()> {
        let mut stmt = conn.prepare(
            "SELECT qualification FROM employee_qualifications WHERE employee_id = ?1;",
        )?;
        let mut rows = stmt.query([self.id])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            self.qualifications.insert(parse_stored::<Qualification>(
                &name,
                "employee_qualifications.qualification",
            )?);
        }
        Ok(())
    }
}

fn replace_qualifications(
    conn: &Connection,
    employee_id: EmployeeId,
    qualifications: &BTreeSet<Qualification>,
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM employee_qualifications WHERE employee_id = ?1;",
        [employee_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO employee_qualifications (employee_id, qualification) VALUES (?1, ?2);",
    )?;
    for qualification in qualifications {
        stmt.execute(params![employee_id, qualification.as_str()])?;
    }
    Ok(())
}

/// Employee store plus company, salary and qualification queries.
pub struct SqliteEmployeeRepository<'conn> {
    store: SqliteStore<'conn, Employee>,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            store: SqliteStore::new(conn),
        }
    }

    pub fn find_by_company(&self, company_id: CompanyId) -> RepoResult<Vec<Employee>> {
        self.store
            .query("WHERE company_id = ?1 ORDER BY id ASC", [company_id])
    }

    pub fn count_by_company(&self, company_id: CompanyId) -> RepoResult<u64> {
        self.store.count_where("WHERE company_id = ?1", [company_id])
    }

    /// Company employees by salary; ties keep id order.
    pub fn find_by_company_sorted_by_salary(
        &self,
        company_id: CompanyId,
        ascending: bool,
    ) -> RepoResult<Vec<Employee>> {
        let clause = if ascending {
            "WHERE company_id = ?1 ORDER BY salary_minor ASC, id ASC"
        } else {
            "WHERE company_id = ?1 ORDER BY salary_minor DESC, id ASC"
        };
        self.store.query(clause, [company_id])
    }

    pub fn find_by_qualification(
        &self,
        company_id: CompanyId,
        qualification: Qualification,
    ) -> RepoResult<Vec<Employee>> {
        self.store.query(
            "WHERE company_id = ?1
               AND id IN (
                   SELECT employee_id FROM employee_qualifications WHERE qualification = ?2
               )
             ORDER BY id ASC",
            params![company_id, qualification.as_str()],
        )
    }

    /// Company employees with `min <= salary <= max`.
    pub fn find_by_salary_range(
        &self,
        company_id: CompanyId,
        min: Decimal,
        max: Decimal,
    ) -> RepoResult<Vec<Employee>> {
        self.store.query(
            "WHERE company_id = ?1 AND salary_minor BETWEEN ?2 AND ?3 ORDER BY id ASC",
            params![
                company_id,
                decimal_to_minor("min_salary", min)?,
                decimal_to_minor("max_salary", max)?,
            ],
        )
    }

    /// Store-wide phone lookup; phones are unique across companies.
    pub fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Employee>> {
        self.store.query_one("WHERE phone = ?1", [phone.trim()])
    }
}

delegate_store!(SqliteEmployeeRepository, Employee);

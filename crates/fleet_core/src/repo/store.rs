//! Generic record store.
//!
//! # Responsibility
//! - Describe how a record type maps onto one SQLite table (`Record`).
//! - Provide the `Store<T>` capability once, for every record type.
//!
//! # Invariants
//! - `save`/`update` validate before writing and re-read after writing, so the
//!   returned value always reflects stored state.
//! - Every mutating call is one savepoint; a failure leaves no partial write.
//! - `find_all` orders by identifier.

use crate::db::with_savepoint;
use crate::model::validation::Validate;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{Connection, Params, Row};
use std::marker::PhantomData;

/// Persisted record stored in one table keyed by `id`.
pub trait Record: Sized + Validate {
    /// Unsaved shape accepted by [`Store::save`].
    type Draft: Validate;

    /// Entity name used in errors and log events.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// `SELECT <columns> FROM <table>` without a trailing clause.
    const SELECT_SQL: &'static str;

    fn id(&self) -> i64;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Inserts a validated draft and returns the assigned identifier.
    fn insert(conn: &Connection, draft: &Self::Draft) -> RepoResult<i64>;

    /// Writes mutable fields of a validated record; returns changed rows.
    fn write(&self, conn: &Connection) -> RepoResult<usize>;

    /// Loads data kept outside the main row (for example link tables).
    fn load_related(&mut self, _conn: &Connection) -> RepoResult<()> {
        Ok(())
    }
}

/// CRUD capability shared by every entity store.
pub trait Store<T: Record> {
    fn save(&self, draft: &T::Draft) -> RepoResult<T>;
    /// Returns `RepoError::NotFound` when the record is absent.
    fn update(&self, record: &T) -> RepoResult<T>;
    /// Returns `RepoError::NotFound` when the record is absent.
    fn delete(&self, record: &T) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn delete_by_id(&self, id: i64) -> RepoResult<bool>;
    fn find_by_id(&self, id: i64) -> RepoResult<Option<T>>;
    fn find_all(&self) -> RepoResult<Vec<T>>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed generic store.
pub struct SqliteStore<'conn, T> {
    conn: &'conn Connection,
    _record: PhantomData<fn() -> T>,
}

impl<'conn, T: Record> SqliteStore<'conn, T> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Runs `SELECT_SQL` followed by `clause` and maps every row.
    pub(crate) fn query<P: Params>(&self, clause: &str, params: P) -> RepoResult<Vec<T>> {
        let sql = format!("{} {clause};", T::SELECT_SQL);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(T::from_row(row)?);
        }

        for record in &mut records {
            record.load_related(self.conn)?;
            record.validate().map_err(|err| {
                RepoError::InvalidData(format!(
                    "{} {} failed validation: {err}",
                    T::ENTITY,
                    record.id()
                ))
            })?;
        }

        Ok(records)
    }

    pub(crate) fn query_one<P: Params>(&self, clause: &str, params: P) -> RepoResult<Option<T>> {
        Ok(self.query(clause, params)?.into_iter().next())
    }

    /// Counts rows of the table matching `clause` (may be empty).
    pub(crate) fn count_where<P: Params>(&self, clause: &str, params: P) -> RepoResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} {clause};", T::TABLE);
        let count: i64 = self.conn.query_row(&sql, params, |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn reload(&self, id: i64) -> RepoResult<T> {
        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("{} {id} missing after write", T::ENTITY))
        })
    }
}

impl<T: Record> Store<T> for SqliteStore<'_, T> {
    fn save(&self, draft: &T::Draft) -> RepoResult<T> {
        draft.validate()?;

        with_savepoint(self.conn, |conn| {
            let id = T::insert(conn, draft)?;
            self.reload(id)
        })
    }

    fn update(&self, record: &T) -> RepoResult<T> {
        record.validate()?;

        with_savepoint(self.conn, |conn| {
            if record.write(conn)? == 0 {
                return Err(RepoError::NotFound {
                    entity: T::ENTITY,
                    id: record.id(),
                });
            }
            self.reload(record.id())
        })
    }

    fn delete(&self, record: &T) -> RepoResult<()> {
        if self.delete_by_id(record.id())? {
            Ok(())
        } else {
            Err(RepoError::NotFound {
                entity: T::ENTITY,
                id: record.id(),
            })
        }
    }

    fn delete_by_id(&self, id: i64) -> RepoResult<bool> {
        with_savepoint(self.conn, |conn| {
            let changed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1;", T::TABLE), [id])?;
            Ok(changed > 0)
        })
    }

    fn find_by_id(&self, id: i64) -> RepoResult<Option<T>> {
        self.query_one("WHERE id = ?1", [id])
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        self.query("ORDER BY id ASC", [])
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_where("", [])
    }
}

/// Implements `Store<$record>` for a repository holding a `store` field.
macro_rules! delegate_store {
    ($repo:ident, $record:ty) => {
        impl crate::repo::store::Store<$record> for $repo<'_> {
            fn save(
                &self,
                draft: &<$record as crate::repo::store::Record>::Draft,
            ) -> crate::repo::RepoResult<$record> {
                self.store.save(draft)
            }

            fn update(&self, record: &$record) -> crate::repo::RepoResult<$record> {
                self.store.update(record)
            }

            fn delete(&self, record: &$record) -> crate::repo::RepoResult<()> {
                self.store.delete(record)
            }

            fn delete_by_id(&self, id: i64) -> crate::repo::RepoResult<bool> {
                self.store.delete_by_id(id)
            }

            fn find_by_id(&self, id: i64) -> crate::repo::RepoResult<Option<$record>> {
                self.store.find_by_id(id)
            }

            fn find_all(&self) -> crate::repo::RepoResult<Vec<$record>> {
                self.store.find_all()
            }

            fn count(&self) -> crate::repo::RepoResult<u64> {
                self.store.count()
            }
        }
    };
}

pub(crate) use delegate_store;

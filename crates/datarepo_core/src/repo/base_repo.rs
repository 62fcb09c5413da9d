//! Generic repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide one CRUD surface for any `Entity`, blocking and async.
//! - Keep SQL generation inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Entity::validate()` before any SQL mutation.
//! - Every mutating call has committed when it returns.
//! - Async variants run the same code path as their blocking twins.

use crate::config::ConnectionConfig;
use crate::db::Session;
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::query::{quote_ident, Filter, OrderBy, PageRequest};
use async_trait::async_trait;
use log::{debug, error};
use rusqlite::types::{ToSql, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::marker::PhantomData;
use std::time::Instant;

/// Blocking CRUD operations over one entity type.
pub trait Repository<T: Entity> {
    /// Looks a record up by primary key.
    fn get(&self, id: &T::Key) -> RepoResult<Option<T>>;

    /// Returns one page of records ordered by `order_by`.
    fn get_page(&self, page: PageRequest, order_by: &OrderBy) -> RepoResult<Vec<T>>;

    /// Returns every stored record, ordered by key.
    fn get_all(&self) -> RepoResult<Vec<T>>;

    /// Returns the single record matching `filter`.
    ///
    /// # Errors
    /// - `RepoError::NonUnique` when more than one record matches.
    fn find(&self, filter: &Filter) -> RepoResult<Option<T>>;

    fn find_all(&self, filter: &Filter) -> RepoResult<Vec<T>>;

    /// Inserts and commits one record, returning it with its key populated.
    fn add(&self, entity: T) -> RepoResult<T>;

    /// Inserts a batch under one commit. Nothing is stored if any row fails.
    fn add_all(&self, entities: Vec<T>) -> RepoResult<Vec<T>>;

    /// Replaces every non-key field of the record at `key` with `updated`'s.
    ///
    /// Returns `None` without writing when no record exists at `key`.
    fn update(&self, updated: &T, key: &T::Key) -> RepoResult<Option<T>>;

    /// Deletes the record carrying `entity`'s key; returns affected rows.
    fn delete(&self, entity: &T) -> RepoResult<usize>;

    fn delete_by_key(&self, key: &T::Key) -> RepoResult<usize>;

    fn count(&self) -> RepoResult<u64>;
}

/// Non-blocking twin of `Repository`, for callers on an async runtime.
#[async_trait]
pub trait AsyncRepository<T: Entity>: Send + Sync {
    async fn get_async(&self, id: T::Key) -> RepoResult<Option<T>>;
    async fn get_page_async(&self, page: PageRequest, order_by: OrderBy) -> RepoResult<Vec<T>>;
    async fn get_all_async(&self) -> RepoResult<Vec<T>>;
    async fn find_async(&self, filter: Filter) -> RepoResult<Option<T>>;
    async fn find_all_async(&self, filter: Filter) -> RepoResult<Vec<T>>;
    async fn add_async(&self, entity: T) -> RepoResult<T>;
    async fn add_all_async(&self, entities: Vec<T>) -> RepoResult<Vec<T>>;
    async fn update_async(&self, updated: T, key: T::Key) -> RepoResult<Option<T>>;
    async fn delete_async(&self, entity: T) -> RepoResult<usize>;
    async fn delete_by_key_async(&self, key: T::Key) -> RepoResult<usize>;
    async fn count_async(&self) -> RepoResult<u64>;
}

/// SQLite-backed repository for entity type `T`.
///
/// Holds a `Session`; the connection is released when the last handle drops
/// or through `close`.
pub struct SqliteRepository<T: Entity> {
    session: Session,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> SqliteRepository<T> {
    /// Creates a repository over a caller-managed session.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    /// Opens a dedicated session from the named connection string.
    pub fn open(config: &ConnectionConfig, name: &str) -> RepoResult<Self> {
        let connection_string = config.connection_string(name).map_err(|err| {
            error!("event=repo_open module=repo status=error connection={name} error={err}");
            RepoError::from(err)
        })?;
        Ok(Self::new(Session::open(connection_string)?))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Releases this repository's session.
    ///
    /// # Errors
    /// - `DbError::SessionInUse` while other handles share the session.
    pub fn close(self) -> RepoResult<()> {
        self.session.close().map_err(RepoError::from)
    }

    fn run<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Connection) -> RepoResult<R>,
    ) -> RepoResult<R> {
        execute::<T, R>(&self.session, op, f)
    }

    async fn run_blocking<R, F>(&self, op: &'static str, f: F) -> RepoResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Connection) -> RepoResult<R> + Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || execute::<T, R>(&session, op, f)).await?
    }
}

impl<T: Entity> Clone for SqliteRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.session.clone())
    }
}

impl<T: Entity> std::fmt::Debug for SqliteRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("table", &T::TABLE)
            .field("session", &self.session)
            .finish()
    }
}

impl<T: Entity> Repository<T> for SqliteRepository<T> {
    fn get(&self, id: &T::Key) -> RepoResult<Option<T>> {
        self.run("get", |conn| get_in::<T>(conn, id))
    }

    fn get_page(&self, page: PageRequest, order_by: &OrderBy) -> RepoResult<Vec<T>> {
        self.run("get_page", |conn| page_in::<T>(conn, page, order_by))
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        self.run("get_all", |conn| all_in::<T>(conn))
    }

    fn find(&self, filter: &Filter) -> RepoResult<Option<T>> {
        self.run("find", |conn| find_in::<T>(conn, filter))
    }

    fn find_all(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        self.run("find_all", |conn| find_all_in::<T>(conn, filter))
    }

    fn add(&self, entity: T) -> RepoResult<T> {
        self.run("add", |conn| add_in(conn, entity))
    }

    fn add_all(&self, entities: Vec<T>) -> RepoResult<Vec<T>> {
        self.run("add_all", |conn| add_all_in(conn, entities))
    }

    fn update(&self, updated: &T, key: &T::Key) -> RepoResult<Option<T>> {
        self.run("update", |conn| update_in(conn, updated, key))
    }

    fn delete(&self, entity: &T) -> RepoResult<usize> {
        match entity.key() {
            Some(key) => self.delete_by_key(&key),
            None => Ok(0),
        }
    }

    fn delete_by_key(&self, key: &T::Key) -> RepoResult<usize> {
        self.run("delete", |conn| delete_in::<T>(conn, key))
    }

    fn count(&self) -> RepoResult<u64> {
        self.run("count", |conn| count_in::<T>(conn))
    }
}

#[async_trait]
impl<T: Entity> AsyncRepository<T> for SqliteRepository<T> {
    async fn get_async(&self, id: T::Key) -> RepoResult<Option<T>> {
        self.run_blocking("get", move |conn| get_in::<T>(conn, &id))
            .await
    }

    async fn get_page_async(&self, page: PageRequest, order_by: OrderBy) -> RepoResult<Vec<T>> {
        self.run_blocking("get_page", move |conn| page_in::<T>(conn, page, &order_by))
            .await
    }

    async fn get_all_async(&self) -> RepoResult<Vec<T>> {
        self.run_blocking("get_all", |conn| all_in::<T>(conn)).await
    }

    async fn find_async(&self, filter: Filter) -> RepoResult<Option<T>> {
        self.run_blocking("find", move |conn| find_in::<T>(conn, &filter))
            .await
    }

    async fn find_all_async(&self, filter: Filter) -> RepoResult<Vec<T>> {
        self.run_blocking("find_all", move |conn| find_all_in::<T>(conn, &filter))
            .await
    }

    async fn add_async(&self, entity: T) -> RepoResult<T> {
        self.run_blocking("add", move |conn| add_in(conn, entity)).await
    }

    async fn add_all_async(&self, entities: Vec<T>) -> RepoResult<Vec<T>> {
        self.run_blocking("add_all", move |conn| add_all_in(conn, entities))
            .await
    }

    async fn update_async(&self, updated: T, key: T::Key) -> RepoResult<Option<T>> {
        self.run_blocking("update", move |conn| update_in(conn, &updated, &key))
            .await
    }

    async fn delete_async(&self, entity: T) -> RepoResult<usize> {
        match entity.key() {
            Some(key) => self.delete_by_key_async(key).await,
            None => Ok(0),
        }
    }

    async fn delete_by_key_async(&self, key: T::Key) -> RepoResult<usize> {
        self.run_blocking("delete", move |conn| delete_in::<T>(conn, &key))
            .await
    }

    async fn count_async(&self) -> RepoResult<u64> {
        self.run_blocking("count", |conn| count_in::<T>(conn)).await
    }
}

fn execute<T: Entity, R>(
    session: &Session,
    op: &'static str,
    f: impl FnOnce(&mut Connection) -> RepoResult<R>,
) -> RepoResult<R> {
    let started_at = Instant::now();
    let result = session.with_connection(f);
    match &result {
        Ok(_) => debug!(
            "event=repo_{op} module=repo status=ok table={} duration_ms={}",
            T::TABLE,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=repo_{op} module=repo status=error table={} duration_ms={} error={}",
            T::TABLE,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn select_sql<T: Entity>() -> String {
    let columns = std::iter::once(T::KEY_COLUMN)
        .chain(T::COLUMNS.iter().copied())
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {}", quote_ident(T::TABLE))
}

fn key_order_sql<T: Entity>() -> String {
    format!(" ORDER BY {} ASC", quote_ident(T::KEY_COLUMN))
}

fn query_entities<T: Entity>(conn: &Connection, sql: &str, binds: Vec<Value>) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(binds), |row| T::from_row(row))?;
    let mut entities = Vec::new();
    for row in rows {
        entities.push(row?);
    }
    Ok(entities)
}

fn get_in<T: Entity>(conn: &Connection, id: &T::Key) -> RepoResult<Option<T>> {
    let sql = format!(
        "{} WHERE {} = ?1;",
        select_sql::<T>(),
        quote_ident(T::KEY_COLUMN)
    );
    let entity = conn
        .query_row(&sql, params![id], |row| T::from_row(row))
        .optional()?;
    Ok(entity)
}

fn page_in<T: Entity>(
    conn: &Connection,
    page: PageRequest,
    order_by: &OrderBy,
) -> RepoResult<Vec<T>> {
    let sql = format!(
        "{}{} LIMIT ? OFFSET ?;",
        select_sql::<T>(),
        order_by.render::<T>()?
    );
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    query_entities(
        conn,
        &sql,
        vec![
            Value::Integer(i64::from(page.page_size())),
            Value::Integer(offset),
        ],
    )
}

fn all_in<T: Entity>(conn: &Connection) -> RepoResult<Vec<T>> {
    let sql = format!("{}{};", select_sql::<T>(), key_order_sql::<T>());
    query_entities(conn, &sql, Vec::new())
}

fn filtered_sql<T: Entity>(filter: &Filter, binds: &mut Vec<Value>) -> RepoResult<String> {
    let mut sql = select_sql::<T>();
    sql.push_str(" WHERE ");
    filter.render::<T>(&mut sql, binds)?;
    sql.push_str(&key_order_sql::<T>());
    Ok(sql)
}

fn find_in<T: Entity>(conn: &Connection, filter: &Filter) -> RepoResult<Option<T>> {
    let mut binds = Vec::new();
    let mut sql = filtered_sql::<T>(filter, &mut binds)?;
    // Two rows are enough to tell "unique" from "ambiguous".
    sql.push_str(" LIMIT 2;");

    let mut matches = query_entities::<T>(conn, &sql, binds)?;
    if matches.len() > 1 {
        return Err(RepoError::NonUnique { table: T::TABLE });
    }
    Ok(matches.pop())
}

fn find_all_in<T: Entity>(conn: &Connection, filter: &Filter) -> RepoResult<Vec<T>> {
    let mut binds = Vec::new();
    let mut sql = filtered_sql::<T>(filter, &mut binds)?;
    sql.push(';');
    query_entities(conn, &sql, binds)
}

fn add_in<T: Entity>(conn: &mut Connection, mut entity: T) -> RepoResult<T> {
    entity.validate()?;

    // The key read-back can fail after the insert; keep both in one commit.
    let tx = conn.transaction()?;
    insert_row(&tx, &mut entity)?;
    tx.commit()?;
    Ok(entity)
}

fn add_all_in<T: Entity>(conn: &mut Connection, mut entities: Vec<T>) -> RepoResult<Vec<T>> {
    for entity in &entities {
        entity.validate()?;
    }

    let tx = conn.transaction()?;
    for entity in &mut entities {
        insert_row(&tx, entity)?;
    }
    tx.commit()?;

    debug!(
        "event=repo_add_all module=repo status=committed table={} rows={}",
        T::TABLE,
        entities.len()
    );
    Ok(entities)
}

/// Inserts `entity` and writes the store-assigned key back into it.
fn insert_row<T: Entity>(conn: &Connection, entity: &mut T) -> RepoResult<()> {
    let key = entity.key();
    let values = entity.values();

    let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
    let mut binds: Vec<&dyn ToSql> = Vec::with_capacity(T::COLUMNS.len() + 1);
    if let Some(key) = key.as_ref() {
        columns.push(T::KEY_COLUMN);
        binds.push(key);
    }
    columns.extend(T::COLUMNS.iter().copied());
    binds.extend(values.iter().map(|value| value as &dyn ToSql));

    let table = quote_ident(T::TABLE);
    let sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES;")
    } else {
        let names = columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!("INSERT INTO {table} ({names}) VALUES ({placeholders});")
    };
    conn.execute(&sql, binds.as_slice())?;

    if key.is_none() {
        let assigned: T::Key = conn.query_row(
            &format!(
                "SELECT {} FROM {table} WHERE rowid = ?1;",
                quote_ident(T::KEY_COLUMN)
            ),
            [conn.last_insert_rowid()],
            |row| row.get(0),
        )?;
        entity.set_key(assigned);
    }
    Ok(())
}

fn update_in<T: Entity>(conn: &mut Connection, updated: &T, key: &T::Key) -> RepoResult<Option<T>> {
    let tx = conn.transaction()?;
    if get_in::<T>(&tx, key)?.is_none() {
        return Ok(None);
    }
    updated.validate()?;

    if !T::COLUMNS.is_empty() {
        let assignments = T::COLUMNS
            .iter()
            .map(|column| format!("{} = ?", quote_ident(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?;",
            quote_ident(T::TABLE),
            quote_ident(T::KEY_COLUMN)
        );
        let values = updated.values();
        let mut binds: Vec<&dyn ToSql> = values.iter().map(|value| value as &dyn ToSql).collect();
        binds.push(key);
        tx.execute(&sql, binds.as_slice())?;
    }

    let stored = get_in::<T>(&tx, key)?;
    tx.commit()?;
    Ok(stored)
}

fn delete_in<T: Entity>(conn: &Connection, key: &T::Key) -> RepoResult<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1;",
        quote_ident(T::TABLE),
        quote_ident(T::KEY_COLUMN)
    );
    Ok(conn.execute(&sql, params![key])?)
}

fn count_in<T: Entity>(conn: &Connection) -> RepoResult<u64> {
    let sql = format!("SELECT COUNT(*) FROM {};", quote_ident(T::TABLE));
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or_default())
}

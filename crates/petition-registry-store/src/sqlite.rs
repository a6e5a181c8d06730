//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the registry. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! SQLite integers are signed 64-bit, so every `u64` column (ids, counts,
//! heights, fees) is stored as an 8-byte big-endian BLOB. The full range
//! round-trips and byte order matches numeric order, so `ORDER BY` on an
//! id column still sorts by id.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use petition_registry_core::{
    Changeset, Petition, PetitionId, PetitionUpdate, Principal, RegistryConfig,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

const PETITION_COLUMNS: &str = "petition_id, creator, title, description, target_signatures,
    current_signatures, deadline, is_active, category, priority, location, tags, timestamp,
    status, min_signatures, max_extension";

const UPDATE_COLUMNS: &str =
    "petition_id, update_title, update_description, update_target, update_timestamp, updater";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn to_sql_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn from_sql_u64(bytes: &[u8], column: &str) -> Result<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("{} is {} bytes, expected 8", column, bytes.len()))
    })?;
    Ok(u64::from_be_bytes(raw))
}

fn from_sql_small(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, value)))
}

// Helper to encode tags to CBOR
fn encode_tags(tags: &[String]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(tags, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_tags(bytes: &[u8]) -> Result<Vec<String>> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// A petition row as stored, before domain decoding.
struct PetitionRow {
    petition_id: Vec<u8>,
    creator: String,
    title: String,
    description: String,
    target_signatures: Vec<u8>,
    current_signatures: Vec<u8>,
    deadline: Vec<u8>,
    is_active: bool,
    category: String,
    priority: i64,
    location: String,
    tags: Vec<u8>,
    timestamp: Vec<u8>,
    status: String,
    min_signatures: Vec<u8>,
    max_extension: i64,
}

impl PetitionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            petition_id: row.get("petition_id")?,
            creator: row.get("creator")?,
            title: row.get("title")?,
            description: row.get("description")?,
            target_signatures: row.get("target_signatures")?,
            current_signatures: row.get("current_signatures")?,
            deadline: row.get("deadline")?,
            is_active: row.get("is_active")?,
            category: row.get("category")?,
            priority: row.get("priority")?,
            location: row.get("location")?,
            tags: row.get("tags")?,
            timestamp: row.get("timestamp")?,
            status: row.get("status")?,
            min_signatures: row.get("min_signatures")?,
            max_extension: row.get("max_extension")?,
        })
    }

    fn decode(self) -> Result<(PetitionId, Petition)> {
        let raw_id = from_sql_u64(&self.petition_id, "petition_id").ok();
        self.try_decode().map_err(|e| {
            tracing::warn!(petition_id = ?raw_id, error = %e, "failed to decode stored petition");
            e
        })
    }

    fn try_decode(self) -> Result<(PetitionId, Petition)> {
        let id = PetitionId::new(from_sql_u64(&self.petition_id, "petition_id")?);
        let petition = Petition {
            creator: Principal::new(self.creator),
            title: self.title,
            description: self.description,
            target_signatures: from_sql_u64(&self.target_signatures, "target_signatures")?,
            current_signatures: from_sql_u64(&self.current_signatures, "current_signatures")?,
            deadline: from_sql_u64(&self.deadline, "deadline")?,
            is_active: self.is_active,
            category: self
                .category
                .parse()
                .map_err(|_| StoreError::InvalidData(format!("category: {}", self.category)))?,
            priority: from_sql_small(self.priority, "priority")?,
            location: self.location,
            tags: decode_tags(&self.tags)?,
            timestamp: from_sql_u64(&self.timestamp, "timestamp")?,
            status: self
                .status
                .parse()
                .map_err(|_| StoreError::InvalidData(format!("status: {}", self.status)))?,
            min_signatures: from_sql_u64(&self.min_signatures, "min_signatures")?,
            max_extension: from_sql_small(self.max_extension, "max_extension")?,
        };
        Ok((id, petition))
    }
}

/// An update-slot row as stored.
struct UpdateRow {
    petition_id: Vec<u8>,
    update_title: String,
    update_description: String,
    update_target: Vec<u8>,
    update_timestamp: Vec<u8>,
    updater: String,
}

impl UpdateRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            petition_id: row.get("petition_id")?,
            update_title: row.get("update_title")?,
            update_description: row.get("update_description")?,
            update_target: row.get("update_target")?,
            update_timestamp: row.get("update_timestamp")?,
            updater: row.get("updater")?,
        })
    }

    fn decode(self) -> Result<(PetitionId, PetitionUpdate)> {
        let id = PetitionId::new(from_sql_u64(&self.petition_id, "petition_id")?);
        Ok((
            id,
            PetitionUpdate {
                update_title: self.update_title,
                update_description: self.update_description,
                update_target: from_sql_u64(&self.update_target, "update_target")?,
                update_timestamp: from_sql_u64(&self.update_timestamp, "update_timestamp")?,
                updater: Principal::new(self.updater),
            },
        ))
    }
}

fn write_config(tx: &rusqlite::Transaction<'_>, config: &RegistryConfig) -> Result<()> {
    tx.execute(
        "INSERT INTO registry_config (id, petition_counter, max_petitions, creation_fee, authority)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            petition_counter = excluded.petition_counter,
            max_petitions = excluded.max_petitions,
            creation_fee = excluded.creation_fee,
            authority = excluded.authority",
        params![
            to_sql_u64(config.petition_counter),
            to_sql_u64(config.max_petitions),
            to_sql_u64(config.creation_fee),
            config.authority.as_ref().map(|p| p.as_str()),
        ],
    )?;
    Ok(())
}

fn write_petition(tx: &rusqlite::Transaction<'_>, id: PetitionId, p: &Petition) -> Result<()> {
    tx.execute(
        "INSERT INTO petitions (
            petition_id, creator, title, description, target_signatures, current_signatures,
            deadline, is_active, category, priority, location, tags, timestamp, status,
            min_signatures, max_extension
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ON CONFLICT(petition_id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            target_signatures = excluded.target_signatures,
            current_signatures = excluded.current_signatures,
            deadline = excluded.deadline,
            is_active = excluded.is_active,
            category = excluded.category,
            priority = excluded.priority,
            location = excluded.location,
            tags = excluded.tags,
            timestamp = excluded.timestamp,
            status = excluded.status,
            min_signatures = excluded.min_signatures,
            max_extension = excluded.max_extension",
        params![
            to_sql_u64(id.get()),
            p.creator.as_str(),
            &p.title,
            &p.description,
            to_sql_u64(p.target_signatures),
            to_sql_u64(p.current_signatures),
            to_sql_u64(p.deadline),
            p.is_active,
            p.category.as_str(),
            i64::from(p.priority),
            &p.location,
            encode_tags(&p.tags)?,
            to_sql_u64(p.timestamp),
            p.status.as_str(),
            to_sql_u64(p.min_signatures),
            i64::from(p.max_extension),
        ],
    )?;
    Ok(())
}

fn write_update(tx: &rusqlite::Transaction<'_>, id: PetitionId, u: &PetitionUpdate) -> Result<()> {
    tx.execute(
        "INSERT INTO petition_updates (
            petition_id, update_title, update_description, update_target, update_timestamp,
            updater
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(petition_id) DO UPDATE SET
            update_title = excluded.update_title,
            update_description = excluded.update_description,
            update_target = excluded.update_target,
            update_timestamp = excluded.update_timestamp,
            updater = excluded.updater",
        params![
            to_sql_u64(id.get()),
            &u.update_title,
            &u.update_description,
            to_sql_u64(u.update_target),
            to_sql_u64(u.update_timestamp),
            u.updater.as_str(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_config(&self) -> Result<Option<RegistryConfig>> {
        self.blocking(|conn| {
            let row: Option<(Vec<u8>, Vec<u8>, Vec<u8>, Option<String>)> = conn
                .query_row(
                    "SELECT petition_counter, max_petitions, creation_fee, authority
                     FROM registry_config WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;

            let Some((counter, max_petitions, creation_fee, authority)) = row else {
                return Ok(None);
            };

            Ok(Some(RegistryConfig {
                petition_counter: from_sql_u64(&counter, "petition_counter")?,
                max_petitions: from_sql_u64(&max_petitions, "max_petitions")?,
                creation_fee: from_sql_u64(&creation_fee, "creation_fee")?,
                authority: authority.map(Principal::new),
            }))
        })
        .await
    }

    async fn load_petitions(&self) -> Result<Vec<(PetitionId, Petition)>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM petitions ORDER BY petition_id",
                PETITION_COLUMNS
            ))?;

            let rows = stmt
                .query_map([], PetitionRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter().map(PetitionRow::decode).collect()
        })
        .await
    }

    async fn load_updates(&self) -> Result<Vec<(PetitionId, PetitionUpdate)>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM petition_updates ORDER BY petition_id",
                UPDATE_COLUMNS
            ))?;

            let rows = stmt
                .query_map([], UpdateRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter().map(UpdateRow::decode).collect()
        })
        .await
    }

    async fn get_petition(&self, id: PetitionId) -> Result<Option<Petition>> {
        let raw_id = to_sql_u64(id.get());

        self.blocking(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM petitions WHERE petition_id = ?1", PETITION_COLUMNS),
                    params![raw_id],
                    PetitionRow::from_row,
                )
                .optional()?;

            row.map(|r| r.decode().map(|(_, petition)| petition))
                .transpose()
        })
        .await
    }

    async fn get_update(&self, id: PetitionId) -> Result<Option<PetitionUpdate>> {
        let raw_id = to_sql_u64(id.get());

        self.blocking(move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM petition_updates WHERE petition_id = ?1",
                        UPDATE_COLUMNS
                    ),
                    params![raw_id],
                    UpdateRow::from_row,
                )
                .optional()?;

            row.map(|r| r.decode().map(|(_, update)| update))
                .transpose()
        })
        .await
    }

    async fn commit(&self, changeset: &Changeset) -> Result<()> {
        let changeset = changeset.clone();

        self.blocking(move |conn| {
            // Dropping the transaction on any error rolls everything back.
            let tx = conn.transaction()?;

            if let Some(config) = &changeset.config {
                write_config(&tx, config)?;
            }
            if let Some((id, petition)) = &changeset.petition {
                write_petition(&tx, *id, petition)?;
            }
            if let Some((id, update)) = &changeset.update {
                write_update(&tx, *id, update)?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }
}

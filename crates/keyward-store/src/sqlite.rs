//! SQLite implementation of the Store trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite behind a
//! mutex; the atomicity-sensitive operations lean on SQLite itself (the
//! nonce primary key, `DELETE ... RETURNING` for token takes) rather than
//! on check-then-act logic in Rust.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use keyward_core::{
    ApplicationId, Client, ClientId, ControllerId, Nonce, RequestToken, Secret, SubjectId,
    TokenId, UnixMillis,
};
use keyward_policy::{AuthorizationEvent, AuthorizationRule, DataType};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ClientInsert, NonceInsert, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
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
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }
}

/// True for the UNIQUE / PRIMARY KEY violations we turn into enum results.
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn row_to_client(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: ClientId::new(row.get::<_, String>("id")?),
        secret: Secret::from_bytes(row.get::<_, Vec<u8>>("secret")?),
        subject: SubjectId::new(row.get::<_, String>("subject")?),
        controller: ControllerId::new(row.get::<_, String>("controller")?),
        application: ApplicationId::new(row.get::<_, String>("application")?),
    })
}

fn row_to_token(row: &rusqlite::Row<'_>) -> rusqlite::Result<RequestToken> {
    Ok(RequestToken {
        id: TokenId::new(row.get::<_, String>("id")?),
        secret: Secret::from_bytes(row.get::<_, Vec<u8>>("secret")?),
        client_id: ClientId::new(row.get::<_, String>("client_id")?),
        valid_from: row.get("valid_from")?,
        valid_to: row.get("valid_to")?,
        authorized: row.get("authorized")?,
        used: row.get("used")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_client(&self, client: &Client) -> Result<ClientInsert> {
        self.with_conn(|conn| {
            let outcome = conn.execute(
                "INSERT INTO clients (id, secret, subject, controller, application)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    client.id.as_str(),
                    client.secret.as_bytes(),
                    client.subject.as_str(),
                    client.controller.as_str(),
                    client.application.as_str(),
                ],
            );
            match outcome {
                Ok(_) => Ok(ClientInsert::Inserted),
                Err(e) if is_constraint_violation(&e) => Ok(ClientInsert::DuplicateTriple),
                Err(e) => Err(e.into()),
            }
        })
    }

    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, secret, subject, controller, application
                     FROM clients WHERE id = ?1",
                    params![id.as_str()],
                    row_to_client,
                )
                .optional()?)
        })
    }

    async fn insert_token(&self, token: &RequestToken) -> Result<()> {
        self.with_conn(|conn| {
            // Plain INSERT: an id collision is a caller bug and must
            // surface, not silently replace the stored token.
            conn.execute(
                "INSERT INTO tokens
                 (id, secret, client_id, valid_from, valid_to, authorized, used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    token.id.as_str(),
                    token.secret.as_bytes(),
                    token.client_id.as_str(),
                    token.valid_from,
                    token.valid_to,
                    token.authorized,
                    token.used,
                ],
            )?;
            Ok(())
        })
    }

    async fn get_token(
        &self,
        id: &TokenId,
        client_id: &ClientId,
    ) -> Result<Option<RequestToken>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, secret, client_id, valid_from, valid_to, authorized, used
                     FROM tokens WHERE id = ?1 AND client_id = ?2",
                    params![id.as_str(), client_id.as_str()],
                    row_to_token,
                )
                .optional()?)
        })
    }

    async fn set_token_authorized(&self, id: &TokenId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tokens SET authorized = 1 WHERE id = ?1",
                params![id.as_str()],
            )?;
            Ok(())
        })
    }

    async fn take_token(
        &self,
        id: &TokenId,
        client_id: &ClientId,
    ) -> Result<Option<RequestToken>> {
        // A single DELETE ... RETURNING statement: the row exists for
        // exactly one caller.
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "DELETE FROM tokens WHERE id = ?1 AND client_id = ?2
                     RETURNING id, secret, client_id, valid_from, valid_to, authorized, used",
                    params![id.as_str(), client_id.as_str()],
                    row_to_token,
                )
                .optional()?)
        })
    }

    async fn insert_nonce(&self, nonce: &Nonce) -> Result<NonceInsert> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO nonces (client_id, value, timestamp)
                 VALUES (?1, ?2, ?3)",
                params![nonce.client_id.as_str(), nonce.value, nonce.timestamp],
            )?;
            Ok(if changed == 1 {
                NonceInsert::Inserted
            } else {
                NonceInsert::Duplicate
            })
        })
    }

    async fn nonce_exists(&self, client_id: &ClientId, value: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM nonces WHERE client_id = ?1 AND value = ?2",
                    params![client_id.as_str(), value],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    async fn prune_nonces(&self, before: UnixMillis) -> Result<u64> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM nonces WHERE timestamp < ?1",
                params![before],
            )?;
            if removed > 0 {
                tracing::debug!(removed, before, "pruned expired nonces");
            }
            Ok(removed as u64)
        })
    }

    async fn get_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<Option<AuthorizationRule>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT subject, controller, data_type, actions, provenances
                     FROM rules WHERE subject = ?1 AND controller = ?2 AND data_type = ?3",
                    params![subject.as_str(), controller.as_str(), data_type.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>("subject")?,
                            row.get::<_, String>("controller")?,
                            row.get::<_, String>("data_type")?,
                            row.get::<_, String>("actions")?,
                            row.get::<_, String>("provenances")?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(subject, controller, data_type, actions, provenances)| {
                Ok(AuthorizationRule {
                    subject: SubjectId::new(subject),
                    controller: ControllerId::new(controller),
                    data_type: DataType::from_str(&data_type).map_err(|_| {
                        StoreError::CorruptRow(format!("unknown data type: {data_type}"))
                    })?,
                    actions: serde_json::from_str(&actions)?,
                    provenances: serde_json::from_str(&provenances)?,
                })
            })
            .transpose()
        })
    }

    async fn upsert_rule(&self, rule: &AuthorizationRule) -> Result<()> {
        let actions = serde_json::to_string(&rule.actions)?;
        let provenances = serde_json::to_string(&rule.provenances)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rules (subject, controller, data_type, actions, provenances)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(subject, controller, data_type)
                 DO UPDATE SET actions = ?4, provenances = ?5",
                params![
                    rule.subject.as_str(),
                    rule.controller.as_str(),
                    rule.data_type.as_str(),
                    actions,
                    provenances,
                ],
            )?;
            Ok(())
        })
    }

    async fn append_decision(&self, event: &AuthorizationEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO decisions (subject, timestamp, event) VALUES (?1, ?2, ?3)",
                params![event.subject.as_str(), event.timestamp, json],
            )?;
            Ok(())
        })
    }

    async fn decisions_for(&self, subject: &SubjectId) -> Result<Vec<AuthorizationEvent>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT event FROM decisions WHERE subject = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![subject.as_str()], |row| {
                row.get::<_, String>(0)
            })?;

            let mut events = Vec::new();
            for json in rows {
                events.push(serde_json::from_str(&json?)?);
            }
            Ok(events)
        })
    }
}

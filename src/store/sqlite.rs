use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};

use super::listeners::{Listener, ListenerRegistry};
use super::merge::apply_write;
use super::{
    AuthProvider, CollectionPath, DocEntry, DocPath, Document, OrderBy, Query, RemoteStore,
    Snapshot, SnapshotSink, StoreError, SubscriptionHandle, WriteMode, is_valid_uid,
};

const ANONYMOUS_UID_KEY: &str = "anonymous_uid";

struct Inner {
    conn: Connection,
    /// Last seen `PRAGMA data_version`; changes when another connection commits.
    data_version: i64,
}

/// Document store in a single SQLite file. Several processes may share the
/// file; [`RemoteStore::poll_external_changes`] picks up their commits.
pub struct SqliteStore {
    inner: Mutex<Inner>,
    listeners: Arc<ListenerRegistry>,
}

impl SqliteStore {
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        migrate(&conn)?;
        let data_version = read_data_version(&conn)?;
        Ok(Self {
            inner: Mutex::new(Inner { conn, data_version }),
            listeners: ListenerRegistry::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a sign-in token for `uid`.
    pub fn issue_token(&self, uid: &str) -> Result<String, StoreError> {
        if !is_valid_uid(uid) {
            return Err(StoreError::Auth(format!("invalid user id '{uid}'")));
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.lock().conn.execute(
            "INSERT INTO auth_tokens (token, uid) VALUES (?1, ?2)",
            params![token, uid],
        )?;
        Ok(token)
    }

    fn notify(conn: &Connection, listeners: Vec<Arc<Listener>>) {
        for l in listeners {
            l.deliver(snapshot(conn, &l.query));
        }
    }
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;

        CREATE TABLE IF NOT EXISTS documents (
            path        TEXT PRIMARY KEY,
            collection  TEXT NOT NULL,
            doc_id      TEXT NOT NULL,
            body        TEXT NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS documents_by_collection
            ON documents (collection, doc_id);

        CREATE TABLE IF NOT EXISTS auth_tokens (
            token  TEXT PRIMARY KEY,
            uid    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn read_data_version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("PRAGMA data_version", [], |r| r.get(0))?)
}

fn parse_body(path: &str, body: &str) -> Result<Document, StoreError> {
    serde_json::from_str(body).map_err(|source| StoreError::Malformed {
        path: path.to_string(),
        source,
    })
}

fn load_doc(conn: &Connection, path: &DocPath) -> Result<Option<Document>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE path = ?1",
            params![path.as_str()],
            |r| r.get(0),
        )
        .optional()?;
    body.map(|b| parse_body(path.as_str(), &b)).transpose()
}

fn valid_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn list_collection(
    conn: &Connection,
    collection: &CollectionPath,
    order_by: Option<&OrderBy>,
) -> Result<Vec<DocEntry>, StoreError> {
    let read_row = |r: &rusqlite::Row<'_>| -> rusqlite::Result<(String, String)> {
        Ok((r.get(0)?, r.get(1)?))
    };

    let rows: Vec<(String, String)> = match order_by {
        Some(o) => {
            if !valid_field(&o.field) {
                return Err(StoreError::Unsupported(format!("order by '{}'", o.field)));
            }
            let dir = if o.descending { "DESC" } else { "ASC" };
            let sql = format!(
                "SELECT doc_id, body FROM documents WHERE collection = ?1 \
                 ORDER BY json_extract(body, ?2) {dir}, doc_id {dir} LIMIT ?3"
            );
            let limit = o.limit.map(|l| l as i64).unwrap_or(-1);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![collection.as_str(), format!("$.{}", o.field), limit],
                    read_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY doc_id",
            )?;
            let rows = stmt
                .query_map(params![collection.as_str()], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    rows.into_iter()
        .map(|(id, body)| {
            let data = parse_body(&format!("{collection}/{id}"), &body)?;
            Ok(DocEntry { id, data })
        })
        .collect()
}

fn snapshot(conn: &Connection, query: &Query) -> Result<Snapshot, StoreError> {
    match query {
        Query::Document(path) => Ok(Snapshot::Document(load_doc(conn, path)?)),
        Query::Collection { path, order_by } => Ok(Snapshot::Collection(list_collection(
            conn,
            path,
            order_by.as_ref(),
        )?)),
    }
}

impl RemoteStore for SqliteStore {
    fn subscribe(
        &self,
        query: Query,
        sink: SnapshotSink,
    ) -> Result<SubscriptionHandle, StoreError> {
        let inner = self.lock();
        // Fail fast on queries the store can never answer.
        snapshot(&inner.conn, &query)?;
        let (listener, handle) = self.listeners.register(query, sink);
        Self::notify(&inner.conn, vec![listener]);
        Ok(handle)
    }

    fn write(
        &self,
        path: &DocPath,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let tx = inner.conn.transaction()?;
        let existing = load_doc(&tx, path)?;
        if mode == WriteMode::Create && existing.is_some() {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        let merged = apply_write(existing, document, mode);
        let body = serde_json::Value::Object(merged).to_string();
        tx.execute(
            r#"
            INSERT INTO documents (path, collection, doc_id, body, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(path) DO UPDATE SET
              body=excluded.body,
              updated_at=excluded.updated_at
            "#,
            params![
                path.as_str(),
                path.collection().as_str(),
                path.id(),
                body,
                crate::domain::now_millis()
            ],
        )?;
        tx.commit()?;
        log::trace!("sqlite store wrote {path}");

        Self::notify(&inner.conn, self.listeners.matching(path));
        Ok(())
    }

    fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        load_doc(&self.lock().conn, path)
    }

    fn supports_server_ordering(&self) -> bool {
        true
    }

    fn poll_external_changes(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let version = read_data_version(&inner.conn)?;
        if version == inner.data_version {
            return Ok(());
        }
        inner.data_version = version;
        log::debug!("sqlite store changed externally; refreshing subscribers");
        Self::notify(&inner.conn, self.listeners.all());
        Ok(())
    }
}

impl AuthProvider for SqliteStore {
    fn sign_in_with_token(&self, token: &str) -> Result<String, StoreError> {
        self.lock()
            .conn
            .query_row(
                "SELECT uid FROM auth_tokens WHERE token = ?1",
                params![token],
                |r| r.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::Auth("unknown token".to_string()))
    }

    fn sign_in_anonymously(&self) -> Result<String, StoreError> {
        let inner = self.lock();
        let existing: Option<String> = inner
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![ANONYMOUS_UID_KEY],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(uid) = existing {
            return Ok(uid);
        }
        let uid = format!("anon-{}", uuid::Uuid::new_v4());
        inner.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)",
            params![ANONYMOUS_UID_KEY, uid],
        )?;
        Ok(uid)
    }
}

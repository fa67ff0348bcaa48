//! Cache store operations.
//!
//! A cache store is the set of entries sharing one `store` name. Stores are
//! never created explicitly: the first `put_entry` brings one into existence
//! and `delete_store` removes it wholesale.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response for one request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedEntry {
    pub store: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedEntry {
    /// Build an entry stamped with the current time.
    pub fn new(
        store: &str, method: &str, url: &str, status: u16, headers: Vec<(String, String)>, body: Vec<u8>,
    ) -> Self {
        Self {
            store: store.to_string(),
            key: compute_request_key(method, url),
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CachedEntry, String)> {
    let headers_json: String = row.get(5)?;
    let entry = CachedEntry {
        store: row.get(0)?,
        key: row.get(1)?,
        method: row.get(2)?,
        url: row.get(3)?,
        status: row.get(4)?,
        headers: Vec::new(),
        body: row.get(6)?,
        stored_at: row.get(7)?,
    };
    Ok((entry, headers_json))
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn decode_headers(mut entry: CachedEntry, headers_json: &str) -> Result<CachedEntry, Error> {
    entry.headers = serde_json::from_str(headers_json)
        .map_err(|e| Error::CorruptEntry(format!("{} {}: headers: {e}", entry.method, entry.url)))?;
    Ok(entry)
}

impl CacheDb {
    /// Insert or replace the response stored for a request descriptor.
    ///
    /// Last write wins when two handlers store the same key concurrently.
    pub async fn put_entry(&self, entry: &CachedEntry) -> Result<(), Error> {
        let entry = entry.clone();
        let headers_json = serde_json::to_string(&entry.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (
                        store, key, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &entry.store,
                        &entry.key,
                        &entry.method,
                        &entry.url,
                        entry.status,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the response stored for `method url` in `store`.
    ///
    /// Returns None on a miss.
    pub async fn match_entry(&self, store: &str, method: &str, url: &str) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let key = compute_request_key(method, url);
        let found = self
            .conn
            .call(move |conn| -> Result<Option<(CachedEntry, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT store, key, method, url, status, headers_json, body, stored_at
                     FROM cache_entries WHERE store = ?1 AND key = ?2",
                )?;

                match stmt.query_row(params![store, key], row_to_entry) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        found.map(|(entry, headers_json)| decode_headers(entry, &headers_json)).transpose()
    }

    /// List the entries of one store, most recently stored first.
    pub async fn list_entries(&self, store: &str) -> Result<Vec<CachedEntry>, Error> {
        let store = store.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(CachedEntry, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT store, key, method, url, status, headers_json, body, stored_at
                     FROM cache_entries WHERE store = ?1 ORDER BY stored_at DESC",
                )?;
                let rows = stmt
                    .query_map(params![store], row_to_entry)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(entry, headers_json)| decode_headers(entry, &headers_json))
            .collect()
    }

    /// Names of every store holding at least one entry.
    pub async fn list_stores(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT store FROM cache_entries ORDER BY store")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a whole store. Returns the number of deleted entries.
    pub async fn delete_store(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE store = ?1", params![store])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns whether it existed.
    pub async fn delete_entry(&self, store: &str, method: &str, url: &str) -> Result<bool, Error> {
        let store = store.to_string();
        let key = compute_request_key(method, url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM cache_entries WHERE store = ?1 AND key = ?2", params![store, key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries of `store` whose URL contains `domain`.
    ///
    /// `domain` is matched literally; LIKE wildcards in it are escaped.
    pub async fn purge_entries_by_domain(&self, store: &str, domain: &str) -> Result<u64, Error> {
        let store = store.to_string();
        let pattern = format!("%{}%", escape_like(domain));
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND url LIKE ?2 ESCAPE '\\'",
                    params![store, pattern],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Drop the oldest entries of `store` until at most `max_entries` remain.
    pub async fn purge_lru_entries(&self, store: &str, max_entries: usize) -> Result<u64, Error> {
        let store = store.to_string();
        let max = i64::try_from(max_entries).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                if count <= max {
                    return Ok(0);
                }

                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND key IN (
                        SELECT key FROM cache_entries WHERE store = ?1 ORDER BY stored_at ASC LIMIT ?2
                    )",
                    params![store, count - max],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

//! Cache entry CRUD operations.
//!
//! Entries live inside a named generation and are keyed by the request's
//! cache key. A lookup by key searches every generation, oldest first, the way
//! a browser's `caches.match` does.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::Error;
use crate::message::{Request, Response};

/// A stored response snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: String,
}

impl CachedResponse {
    /// Snapshot a response for the request that produced it.
    ///
    /// Headers whose values are not valid UTF-8 are dropped.
    pub fn capture(request: &Request, response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        Self {
            method: request.method.as_str().to_string(),
            url: request.url.as_str().to_string(),
            status_code: response.status.as_u16(),
            headers,
            body: response.body.clone(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the response this snapshot was taken from.
    pub fn to_response(&self) -> Response {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                headers.append(name, value);
            }
        }

        Response {
            status: StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK),
            headers,
            body: self.body.clone(),
        }
    }
}

impl CacheDb {
    /// Create a generation if it doesn't exist yet.
    pub async fn open_generation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite an entry, creating the generation on demand.
    pub async fn put_entry(&self, generation: &str, key: &str, entry: &CachedResponse) -> Result<(), Error> {
        let generation = generation.to_string();
        let key = key.to_string();
        let entry = entry.clone();
        let headers_json = serde_json::to_string(&entry.headers)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&generation, &entry.stored_at],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                    generation, key, method, url, status_code, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(generation, key) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status_code = excluded.status_code,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &generation,
                        &key,
                        &entry.method,
                        &entry.url,
                        entry.status_code,
                        &headers_json,
                        entry.body.as_ref(),
                        &entry.stored_at,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Find an entry by key in any generation.
    ///
    /// Generations are searched in creation order; the first hit wins.
    pub async fn match_entry(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url, e.status_code, e.headers_json, e.body, e.stored_at
                FROM entries e JOIN generations g ON g.name = e.generation
                WHERE e.key = ?1
                ORDER BY g.rowid ASC
                LIMIT 1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u16>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                });

                match result {
                    Ok((method, url, status_code, headers_json, body, stored_at)) => Ok(Some(CachedResponse {
                        method,
                        url,
                        status_code,
                        headers: serde_json::from_str(&headers_json)?,
                        body: Bytes::from(body),
                        stored_at,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and, by cascade, all of its entries.
    ///
    /// Returns false if no such generation existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// All generation names, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by a generation.
    pub async fn count_entries(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

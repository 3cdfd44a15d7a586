//! Page annotations and history ranking from `places.sqlite`.

use std::path::Path;

use md5::{Digest, Md5};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use url::Url;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::error::HostError;
use crate::host::{AnnotationStore, AnnotationValue, Expiration, Link};

/// Annotation type codes stored in `moz_annos.type`.
const TYPE_INT32: i64 = 1;
const TYPE_DOUBLE: i64 = 2;
const TYPE_STRING: i64 = 3;
const TYPE_INT64: i64 = 5;

/// Tables this module reads and writes, as the browser lays them out.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS moz_places (
    id INTEGER PRIMARY KEY,
    url LONGVARCHAR,
    title LONGVARCHAR,
    rev_host LONGVARCHAR,
    visit_count INTEGER DEFAULT 0,
    hidden INTEGER DEFAULT 0 NOT NULL,
    typed INTEGER DEFAULT 0 NOT NULL,
    frecency INTEGER DEFAULT -1 NOT NULL,
    last_visit_date INTEGER,
    guid TEXT,
    url_hash INTEGER DEFAULT 0 NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS moz_places_guid_uniqueindex ON moz_places (guid);
CREATE TABLE IF NOT EXISTS moz_anno_attributes (
    id INTEGER PRIMARY KEY,
    name VARCHAR(32) UNIQUE NOT NULL
);
CREATE TABLE IF NOT EXISTS moz_annos (
    id INTEGER PRIMARY KEY,
    place_id INTEGER NOT NULL,
    anno_attribute_id INTEGER,
    content LONGVARCHAR,
    flags INTEGER DEFAULT 0,
    expiration INTEGER DEFAULT 0,
    type INTEGER DEFAULT 0,
    dateAdded INTEGER DEFAULT 0,
    lastModified INTEGER DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS moz_annos_placeattributeindex
    ON moz_annos (place_id, anno_attribute_id);
";

/// Connection to a places database.
pub struct PlacesDb {
    conn: Connection,
}

impl PlacesDb {
    /// Open an existing database. The file must exist.
    pub fn open(path: &Path) -> Result<Self, HostError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        log::debug!("Opened places database {:?}", path);
        Ok(Self { conn })
    }

    /// Open a private in-memory database with an empty schema.
    pub fn open_in_memory() -> Result<Self, HostError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.create_schema()?;
        Ok(db)
    }

    /// Create the tables if they do not exist yet.
    pub fn create_schema(&self) -> Result<(), HostError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Most relevant visible pages, highest frecency first.
    pub fn top_sites(&self, limit: usize) -> Result<Vec<Link>, HostError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT url, title FROM moz_places
             WHERE frecency > 0 AND hidden = 0
             ORDER BY frecency DESC, id ASC
             LIMIT ?1",
        )?;
        let links = stmt
            .query_map(params![limit], |row| {
                Ok(Link {
                    url: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Set a page's frecency, creating the page if needed.
    pub fn set_frecency(
        &self,
        url: &Url,
        title: Option<&str>,
        frecency: i64,
    ) -> Result<(), HostError> {
        let id = ensure_place(&self.conn, url)?;
        self.conn.execute(
            "UPDATE moz_places SET frecency = ?1, title = COALESCE(?2, title) WHERE id = ?3",
            params![frecency, title, id],
        )?;
        Ok(())
    }
}

impl AnnotationStore for PlacesDb {
    fn pages_with_annotation(&self, name: &str) -> Result<Vec<Url>, HostError> {
        let mut stmt = self.conn.prepare(
            "SELECT h.url FROM moz_annos a
             JOIN moz_anno_attributes n ON n.id = a.anno_attribute_id
             JOIN moz_places h ON h.id = a.place_id
             WHERE n.name = ?1
             ORDER BY h.url",
        )?;
        let urls = stmt
            .query_map(params![name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        urls.into_iter()
            .map(|url| Url::parse(&url).map_err(|source| HostError::InvalidUrl { url, source }))
            .collect()
    }

    fn page_annotation(&self, page: &Url, name: &str) -> Result<AnnotationValue, HostError> {
        let row = self
            .conn
            .query_row(
                "SELECT a.content, a.type FROM moz_annos a
                 JOIN moz_anno_attributes n ON n.id = a.anno_attribute_id
                 JOIN moz_places h ON h.id = a.place_id
                 WHERE n.name = ?1 AND h.url = ?2",
                params![name, page.as_str()],
                |row| Ok((row.get::<_, SqlValue>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let (content, kind) =
            row.ok_or_else(|| HostError::no_such_key(format!("{name} on {page}")))?;
        annotation_from_sql(name, content, kind)
    }

    fn annotations_named(&self, name: &str) -> Result<Vec<(String, AnnotationValue)>, HostError> {
        let mut stmt = self.conn.prepare(
            "SELECT h.url, a.content, a.type FROM moz_annos a
             JOIN moz_anno_attributes n ON n.id = a.anno_attribute_id
             JOIN moz_places h ON h.id = a.place_id
             WHERE n.name = ?1
             ORDER BY h.url",
        )?;
        let rows = stmt
            .query_map(params![name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, SqlValue>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(url, content, kind)| Ok((url, annotation_from_sql(name, content, kind)?)))
            .collect()
    }

    fn set_page_annotation(
        &mut self,
        page: &Url,
        name: &str,
        value: &AnnotationValue,
        expiration: Expiration,
    ) -> Result<(), HostError> {
        let tx = self.conn.transaction()?;
        let place_id = ensure_place(&tx, page)?;
        let attribute_id = attribute_id(&tx, name)?;
        let (content, kind) = annotation_to_sql(value);
        let now = now_micros();
        tx.execute(
            "INSERT INTO moz_annos
                 (place_id, anno_attribute_id, content, flags, expiration, type, dateAdded, lastModified)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?6)
             ON CONFLICT (place_id, anno_attribute_id) DO UPDATE SET
                 content = excluded.content,
                 expiration = excluded.expiration,
                 type = excluded.type,
                 lastModified = excluded.lastModified",
            params![place_id, attribute_id, content, expiration_code(expiration), kind, now],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn ensure_place(conn: &Connection, url: &Url) -> Result<i64, HostError> {
    let existing = conn
        .query_row(
            "SELECT id FROM moz_places WHERE url = ?1",
            params![url.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO moz_places (url, rev_host, hidden, frecency, guid)
         VALUES (?1, ?2, 0, -1, ?3)",
        params![url.as_str(), reversed_host(url), place_guid(url)],
    )?;
    log::debug!("Added page {}", url);
    Ok(conn.last_insert_rowid())
}

fn attribute_id(conn: &Connection, name: &str) -> Result<i64, HostError> {
    conn.execute(
        "INSERT OR IGNORE INTO moz_anno_attributes (name) VALUES (?1)",
        params![name],
    )?;
    let id = conn.query_row(
        "SELECT id FROM moz_anno_attributes WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Host name reversed with a trailing dot, as `moz_places.rev_host` stores it.
fn reversed_host(url: &Url) -> String {
    let mut reversed: String = url.host_str().unwrap_or_default().chars().rev().collect();
    reversed.push('.');
    reversed
}

/// Stable 12-character identifier derived from the URL.
fn place_guid(url: &Url) -> String {
    let digest = format!("{:x}", Md5::digest(url.as_str().as_bytes()));
    digest[..12].to_string()
}

fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn expiration_code(expiration: Expiration) -> i64 {
    match expiration {
        Expiration::Session => 0,
        Expiration::Never => 4,
        Expiration::WithHistory => 5,
    }
}

fn annotation_to_sql(value: &AnnotationValue) -> (SqlValue, i64) {
    match value {
        AnnotationValue::Int(i) if i32::try_from(*i).is_ok() => (SqlValue::Integer(*i), TYPE_INT32),
        AnnotationValue::Int(i) => (SqlValue::Integer(*i), TYPE_INT64),
        AnnotationValue::Double(f) => (SqlValue::Real(*f), TYPE_DOUBLE),
        AnnotationValue::String(s) => (SqlValue::Text(s.clone()), TYPE_STRING),
    }
}

fn annotation_from_sql(name: &str, content: SqlValue, kind: i64) -> Result<AnnotationValue, HostError> {
    let value = match (kind, content) {
        (TYPE_STRING, SqlValue::Text(s)) => AnnotationValue::String(s),
        (TYPE_INT32 | TYPE_INT64, SqlValue::Integer(i)) => AnnotationValue::Int(i),
        (TYPE_INT32 | TYPE_INT64, SqlValue::Text(s)) => s
            .parse()
            .map(AnnotationValue::Int)
            .map_err(|_| HostError::malformed(name, format!("integer annotation holds {s:?}")))?,
        (TYPE_DOUBLE, SqlValue::Real(f)) => AnnotationValue::Double(f),
        (TYPE_DOUBLE, SqlValue::Integer(i)) => AnnotationValue::Double(i as f64),
        (TYPE_DOUBLE, SqlValue::Text(s)) => s
            .parse()
            .map(AnnotationValue::Double)
            .map_err(|_| HostError::malformed(name, format!("double annotation holds {s:?}")))?,
        (kind, content) => {
            return Err(HostError::malformed(
                name,
                format!("unsupported annotation type {kind} with content {content:?}"),
            ));
        }
    };
    Ok(value)
}

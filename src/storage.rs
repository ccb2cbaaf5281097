use std::path::Path;

use rusqlite::Connection;
use spdlog::debug;

use crate::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    date           TEXT    NOT NULL,
    modified       TEXT    NOT NULL,
    title          TEXT    NOT NULL,
    content        TEXT    NOT NULL,
    slug           TEXT    NOT NULL,
    type           TEXT    NOT NULL DEFAULT 'post',
    taxonomy       INTEGER NOT NULL DEFAULT 1,
    status         TEXT    NOT NULL DEFAULT 'public',
    comment_status INTEGER NOT NULL DEFAULT 1,
    password       TEXT    NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS posts_date ON posts (date);
CREATE INDEX IF NOT EXISTS posts_taxonomy ON posts (taxonomy);
CREATE INDEX IF NOT EXISTS posts_slug ON posts (slug);

CREATE TABLE IF NOT EXISTS taxonomies (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name   TEXT    NOT NULL,
    slug   TEXT    NOT NULL,
    parent INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS options (
    name  TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT    NOT NULL UNIQUE,
    alias INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS post_tags (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    tag_id  INTEGER NOT NULL,
    UNIQUE (post_id, tag_id)
);
CREATE INDEX IF NOT EXISTS post_tags_tag ON post_tags (tag_id);
"#;

/// `?, ?, ?` for `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Owns the SQLite connection shared by posts, taxonomies, tags and options.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Database> {
        debug!("Opening database {}", path.display());
        let conn = Connection::open(path)?;
        Ok(Database { conn })
    }

    pub fn open_in_memory() -> Result<Database> {
        let conn = Connection::open_in_memory()?;
        Ok(Database { conn })
    }

    /// Creates the tables if they are missing. Safe to run on every start.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

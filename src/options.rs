use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::storage::Database;

pub const POSTS_PER_PAGE: &str = "posts_per_page";

/// Site-wide name/value settings kept in the `options` table.
pub struct Options<'a> {
    db: &'a Database,
}

impl<'a> Options<'a> {
    pub fn new(db: &'a Database) -> Self {
        Options { db }
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let value = self.db.conn()
            .query_row("SELECT value FROM options WHERE name=?1 LIMIT 1", params![name], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        self.db.conn().execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value=excluded.value",
            params![name, value])?;
        Ok(())
    }

    pub fn del(&self, name: &str) -> Result<bool> {
        let deleted = self.db.conn().execute("DELETE FROM options WHERE name=?1", params![name])?;
        Ok(deleted > 0)
    }

    /// Page size stored under `posts_per_page`, if it is a positive integer.
    pub fn posts_per_page(&self) -> Result<Option<u32>> {
        let value = self.get(POSTS_PER_PAGE)?;
        Ok(value.and_then(|v| v.trim().parse::<u32>().ok()).filter(|&v| v > 0))
    }
}
